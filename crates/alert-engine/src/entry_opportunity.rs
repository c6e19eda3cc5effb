//! Entry Opportunity Rule
//!
//! A healthy pullback inside an intact uptrend. All of these must hold:
//! - close above the long moving average
//! - long average slope flat or rising
//! - pullback from the recent high inside the configured band (inclusive)
//! - no outsized daily move over the trailing stability window
//!
//! Any sub-check without enough data means no alert.

use analysis_core::{AlertKind, AlertRecord, PriceSeries, SlopeClassification};

use crate::config::RuleConfig;
use crate::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone)]
pub struct EntryOpportunityEvaluator {
    long_period: usize,
    pullback_window: usize,
    pullback_min_pct: f64,
    pullback_max_pct: f64,
}

impl EntryOpportunityEvaluator {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            long_period: config.long_period,
            pullback_window: config.pullback_window,
            pullback_min_pct: config.pullback_min_pct,
            pullback_max_pct: config.pullback_max_pct,
        }
    }

    pub fn evaluate(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot) -> Option<AlertRecord> {
        let symbol = series.symbol();

        let long = snapshot.long_ma?;
        if snapshot.close <= long {
            tracing::debug!("{}: close {:.2} not above long average {:.2}", symbol, snapshot.close, long);
            return None;
        }

        let slope = snapshot.long_slope?;
        if slope == SlopeClassification::Falling {
            tracing::debug!("{}: long average is falling", symbol);
            return None;
        }

        let pullback = snapshot.pullback_pct?;
        if pullback < self.pullback_min_pct || pullback > self.pullback_max_pct {
            tracing::debug!(
                "{}: pullback {:.2}% outside {}-{}%",
                symbol,
                pullback,
                self.pullback_min_pct,
                self.pullback_max_pct
            );
            return None;
        }

        if snapshot.stable != Some(true) {
            tracing::debug!("{}: recent price action not stable", symbol);
            return None;
        }

        let high = snapshot
            .pullback_high
            .map(|h| format!(" of {:.2}", h))
            .unwrap_or_default();

        Some(AlertRecord::new(
            AlertKind::EntryOpportunity,
            symbol,
            format!(
                "Pullback {:.1}% from {}-day high{} in healthy uptrend (price above {}-DMA {:.2}, slope {})",
                pullback,
                self.pullback_window,
                high,
                self.long_period,
                long,
                slope.to_label()
            ),
            snapshot.close,
            snapshot.date,
        ))
    }
}
