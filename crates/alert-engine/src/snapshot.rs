//! Indicator snapshot
//!
//! Everything the rules look at, computed once per series. A value that could
//! not be computed is `None` and every rule treats `None` as "does not fire".

use analysis_core::{AnalysisError, PriceSeries, SlopeClassification};
use chrono::NaiveDate;
use serde::Serialize;
use technical_analysis::{classify_slope, compute_drawdown, compute_sma, is_stable, period_high};

use crate::config::RuleConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub date: NaiveDate,
    pub short_ma: Option<f64>,
    pub short_ma_prev: Option<f64>,
    pub long_ma: Option<f64>,
    pub long_ma_prev: Option<f64>,
    pub long_slope: Option<SlopeClassification>,
    pub drawdown_pct: Option<f64>,
    pub drawdown_high: Option<f64>,
    pub pullback_pct: Option<f64>,
    pub pullback_high: Option<f64>,
    pub stable: Option<bool>,
}

impl IndicatorSnapshot {
    /// Snapshot with only the latest close filled in.
    pub fn bare(close: f64, date: NaiveDate) -> Self {
        Self {
            close,
            date,
            short_ma: None,
            short_ma_prev: None,
            long_ma: None,
            long_ma_prev: None,
            long_slope: None,
            drawdown_pct: None,
            drawdown_high: None,
            pullback_pct: None,
            pullback_high: None,
            stable: None,
        }
    }

    /// Compute all indicators for the latest observation.
    ///
    /// Fails with `InsufficientData` when the series is shorter than
    /// [`RuleConfig::min_history`]; individual indicators that still lack
    /// history are left as `None`.
    pub fn compute(series: &PriceSeries, config: &RuleConfig) -> Result<Self, AnalysisError> {
        let latest = match series.latest() {
            Some(latest) if series.len() >= config.min_history() => *latest,
            _ => {
                return Err(AnalysisError::InsufficientData(format!(
                    "{}: {} observations, need {}",
                    series.symbol(),
                    series.len(),
                    config.min_history()
                )))
            }
        };

        let symbol = series.symbol();
        let short = compute_sma(series, config.short_period);
        let long = compute_sma(series, config.long_period);

        let long_slope = available(
            symbol,
            "long average slope",
            classify_slope(&long, config.slope_lookback, config.slope_tolerance_pct),
        );
        let drawdown_pct = available(
            symbol,
            "drawdown",
            compute_drawdown(series, config.drawdown_window, config.min_window_observations),
        );
        let pullback_pct = available(
            symbol,
            "pullback",
            compute_drawdown(series, config.pullback_window, config.min_window_observations),
        );
        let stable = available(
            symbol,
            "stability",
            is_stable(series, config.stability_days, config.max_daily_move_pct),
        );

        Ok(Self {
            close: latest.close,
            date: latest.date,
            short_ma: short.latest(),
            short_ma_prev: short.previous(),
            long_ma: long.latest(),
            long_ma_prev: long.previous(),
            long_slope,
            drawdown_pct,
            drawdown_high: drawdown_pct.and(period_high(series, config.drawdown_window)),
            pullback_pct,
            pullback_high: pullback_pct.and(period_high(series, config.pullback_window)),
            stable,
        })
    }
}

fn available<T>(symbol: &str, what: &str, result: Result<T, AnalysisError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("{}: {} unavailable: {}", symbol, what, e);
            None
        }
    }
}
