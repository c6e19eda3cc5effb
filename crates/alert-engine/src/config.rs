//! Rule thresholds
//!
//! Every threshold the evaluators use lives here so a run is fully described
//! by one value passed into the aggregator.

use std::path::Path;

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Thresholds for the exit-risk and entry-opportunity rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Short moving average period (trading days)
    pub short_period: usize,
    /// Long moving average period, also the minimum history for any evaluation
    pub long_period: usize,
    /// Lookback for the long average slope
    pub slope_lookback: usize,
    /// Relative change (percent) inside which the slope counts as flat
    pub slope_tolerance_pct: f64,
    /// Trailing window for the exit drawdown (~3 months)
    pub drawdown_window: usize,
    /// Drawdown (percent) at or above which exit risk fires
    pub drawdown_threshold_pct: f64,
    /// Trailing window for the entry pullback (~1 month)
    pub pullback_window: usize,
    /// Inclusive lower bound of the healthy pullback band (percent)
    pub pullback_min_pct: f64,
    /// Inclusive upper bound of the healthy pullback band (percent)
    pub pullback_max_pct: f64,
    /// Number of trailing daily moves checked for stability
    pub stability_days: usize,
    /// Largest absolute daily move (percent) still considered stable
    pub max_daily_move_pct: f64,
    /// Fewest closes a drawdown window may hold
    pub min_window_observations: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            short_period: 50,
            long_period: 100,
            slope_lookback: 20,
            slope_tolerance_pct: 0.5,
            drawdown_window: 63,
            drawdown_threshold_pct: 10.0,
            pullback_window: 21,
            pullback_min_pct: 5.0,
            pullback_max_pct: 8.0,
            stability_days: 5,
            max_daily_move_pct: 5.0,
            min_window_observations: 5,
        }
    }
}

impl RuleConfig {
    /// Load thresholds from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AnalysisError> {
        let config: RuleConfig = serde_json::from_str(raw)
            .map_err(|e| AnalysisError::Configuration(format!("invalid rule config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Histories shorter than this produce no alerts.
    pub fn min_history(&self) -> usize {
        self.long_period
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let periods = [
            ("short_period", self.short_period),
            ("long_period", self.long_period),
            ("slope_lookback", self.slope_lookback),
            ("drawdown_window", self.drawdown_window),
            ("pullback_window", self.pullback_window),
            ("stability_days", self.stability_days),
            ("min_window_observations", self.min_window_observations),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(AnalysisError::Configuration(format!("{} must be at least 1", name)));
        }

        if self.short_period >= self.long_period {
            return Err(AnalysisError::Configuration(format!(
                "short_period ({}) must be below long_period ({})",
                self.short_period, self.long_period
            )));
        }

        let percents = [
            ("drawdown_threshold_pct", self.drawdown_threshold_pct),
            ("pullback_min_pct", self.pullback_min_pct),
            ("pullback_max_pct", self.pullback_max_pct),
            ("max_daily_move_pct", self.max_daily_move_pct),
        ];
        if let Some((name, value)) = percents
            .iter()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0 || *value >= 100.0)
        {
            return Err(AnalysisError::Configuration(format!(
                "{} must be between 0 and 100, got {}",
                name, value
            )));
        }

        if !self.slope_tolerance_pct.is_finite() || self.slope_tolerance_pct < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "slope_tolerance_pct must be non-negative, got {}",
                self.slope_tolerance_pct
            )));
        }

        if self.pullback_min_pct > self.pullback_max_pct {
            return Err(AnalysisError::Configuration(format!(
                "pullback band is inverted: {} > {}",
                self.pullback_min_pct, self.pullback_max_pct
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RuleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_history(), 100);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RuleConfig::from_json_str(r#"{"pullback_max_pct": 9.0, "stability_days": 3}"#).unwrap();

        assert_eq!(config.pullback_max_pct, 9.0);
        assert_eq!(config.stability_days, 3);
        assert_eq!(config.long_period, 100);
        assert_eq!(config.drawdown_threshold_pct, 10.0);
    }

    #[test]
    fn test_rejects_inverted_periods() {
        let config = RuleConfig { short_period: 100, long_period: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn test_rejects_inverted_pullback_band() {
        let err = RuleConfig::from_json_str(r#"{"pullback_min_pct": 8.0, "pullback_max_pct": 5.0}"#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rejects_zero_window_and_bad_percent() {
        let config = RuleConfig { drawdown_window: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = RuleConfig { drawdown_threshold_pct: 150.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(RuleConfig::from_json_str("{ not json").is_err());
        assert!(RuleConfig::from_json_str(r#"{"long_period": "long"}"#).is_err());
    }
}
