//! Exit Risk Rules
//!
//! Two conditions checked in priority order, first match wins:
//! a bearish moving-average crossover at the latest observation, then a
//! drawdown from the trailing high at or beyond the threshold.

use analysis_core::{AlertKind, AlertRecord, PriceSeries};

use crate::config::RuleConfig;
use crate::snapshot::IndicatorSnapshot;

#[derive(Debug, Clone)]
pub struct ExitRiskEvaluator {
    short_period: usize,
    long_period: usize,
    drawdown_window: usize,
    drawdown_threshold_pct: f64,
}

impl ExitRiskEvaluator {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            short_period: config.short_period,
            long_period: config.long_period,
            drawdown_window: config.drawdown_window,
            drawdown_threshold_pct: config.drawdown_threshold_pct,
        }
    }

    /// At most one exit-risk alert per series.
    pub fn evaluate(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot) -> Option<AlertRecord> {
        self.trend_deterioration(series, snapshot)
            .or_else(|| self.drawdown_breach(series, snapshot))
    }

    /// Fires only on the day the short average moves from at-or-above to below
    /// the long average, not on the days it stays below.
    pub fn trend_deterioration(
        &self,
        series: &PriceSeries,
        snapshot: &IndicatorSnapshot,
    ) -> Option<AlertRecord> {
        let short = snapshot.short_ma?;
        let short_prev = snapshot.short_ma_prev?;
        let long = snapshot.long_ma?;
        let long_prev = snapshot.long_ma_prev?;

        if !(short < long && short_prev >= long_prev) {
            return None;
        }

        Some(AlertRecord::new(
            AlertKind::ExitRisk,
            series.symbol(),
            format!(
                "Moving-average crossover: {}-DMA ({:.2}) crossed below {}-DMA ({:.2})",
                self.short_period, short, self.long_period, long
            ),
            snapshot.close,
            snapshot.date,
        ))
    }

    pub fn drawdown_breach(
        &self,
        series: &PriceSeries,
        snapshot: &IndicatorSnapshot,
    ) -> Option<AlertRecord> {
        let drawdown = snapshot.drawdown_pct?;
        if drawdown < self.drawdown_threshold_pct {
            return None;
        }

        let high = snapshot
            .drawdown_high
            .map(|h| format!(" of {:.2}", h))
            .unwrap_or_default();

        Some(AlertRecord::new(
            AlertKind::ExitRisk,
            series.symbol(),
            format!(
                "Drawdown {:.1}% from {}-day high{}",
                drawdown, self.drawdown_window, high
            ),
            snapshot.close,
            snapshot.date,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn evaluator() -> ExitRiskEvaluator {
        ExitRiskEvaluator::new(&RuleConfig::default())
    }

    fn evaluate_closes(closes: &[f64]) -> Option<AlertRecord> {
        let series = series_from("TEST", closes);
        let snapshot = IndicatorSnapshot::compute(&series, &RuleConfig::default()).ok()?;
        evaluator().evaluate(&series, &snapshot)
    }

    fn snapshot_with_averages(short: f64, short_prev: f64, long: f64, long_prev: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            short_ma: Some(short),
            short_ma_prev: Some(short_prev),
            long_ma: Some(long),
            long_ma_prev: Some(long_prev),
            drawdown_pct: Some(2.0),
            ..IndicatorSnapshot::bare(100.0, start_date())
        }
    }

    #[test]
    fn test_drawdown_breach_reports_one_decimal() {
        let alert = evaluate_closes(&drawdown_closes()).expect("drawdown should fire");

        assert_eq!(alert.kind, AlertKind::ExitRisk);
        assert!(alert.reason.contains("10.4%"), "reason was {}", alert.reason);
        assert!(alert.reason.contains("25.46"));
        assert!((alert.price - 22.81).abs() < 1e-9);
        assert_eq!(alert.date, start_date() + chrono::Duration::days(149));
    }

    #[test]
    fn test_drawdown_threshold_is_inclusive() {
        let series = series_from("TEST", &[100.0; 5]);
        let at_threshold = IndicatorSnapshot {
            drawdown_pct: Some(10.0),
            ..IndicatorSnapshot::bare(90.0, start_date())
        };
        let below = IndicatorSnapshot {
            drawdown_pct: Some(9.99),
            ..IndicatorSnapshot::bare(90.01, start_date())
        };

        assert!(evaluator().drawdown_breach(&series, &at_threshold).is_some());
        assert!(evaluator().drawdown_breach(&series, &below).is_none());
    }

    #[test]
    fn test_crossover_requires_transition() {
        let series = series_from("TEST", &[100.0; 5]);

        let crossing = snapshot_with_averages(99.0, 100.5, 100.0, 100.4);
        let alert = evaluator().trend_deterioration(&series, &crossing).expect("crossover");
        assert!(alert.reason.contains("crossover"));
        assert!(alert.reason.contains("50-DMA"));

        // Touching on the previous day still counts as "at or above"
        let touching = snapshot_with_averages(99.0, 100.0, 100.0, 100.0);
        assert!(evaluator().trend_deterioration(&series, &touching).is_some());

        let already_below = snapshot_with_averages(98.0, 99.0, 100.0, 100.0);
        assert!(evaluator().trend_deterioration(&series, &already_below).is_none());

        let still_above = snapshot_with_averages(101.0, 101.5, 100.0, 100.0);
        assert!(evaluator().trend_deterioration(&series, &still_above).is_none());
    }

    #[test]
    fn test_crossover_fires_once_for_sustained_state() {
        let closes = crossover_closes();
        let crossover_days: Vec<usize> = (101..=closes.len())
            .filter(|&n| {
                evaluate_closes(&closes[..n])
                    .map(|alert| alert.reason.contains("crossover"))
                    .unwrap_or(false)
            })
            .collect();

        assert_eq!(crossover_days, vec![166]);
    }

    #[test]
    fn test_crossover_takes_priority_over_drawdown() {
        let closes = crossover_closes();
        let alert = evaluate_closes(&closes[..166]).unwrap();
        assert!(alert.reason.contains("crossover"));

        // Later days are past the crossover but deep in drawdown
        let alert = evaluate_closes(&closes[..170]).unwrap();
        assert!(alert.reason.starts_with("Drawdown"));
    }

    #[test]
    fn test_missing_averages_skip_crossover_only() {
        let series = series_from("TEST", &[100.0; 5]);
        let snapshot = IndicatorSnapshot {
            drawdown_pct: Some(12.5),
            ..IndicatorSnapshot::bare(87.5, start_date())
        };

        let alert = evaluator().evaluate(&series, &snapshot).unwrap();
        assert!(alert.reason.contains("12.5%"));
    }

    #[test]
    fn test_short_history_never_fires() {
        let closes = drawdown_closes();
        assert!(evaluate_closes(&closes[closes.len() - 99..]).is_none());
        assert!(evaluate_closes(&[10.0; 99]).is_none());
    }

    #[test]
    fn test_healthy_uptrend_has_no_exit_risk() {
        let closes: Vec<f64> = (0..150).map(|i| 50.0 + i as f64 * 0.2).collect();
        assert!(evaluate_closes(&closes).is_none());
    }
}
