use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily close history for one symbol, ordered by date.
///
/// Built once per run from provider data and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    /// Validates the observations: strictly increasing dates, finite positive closes.
    pub fn new(
        symbol: impl Into<String>,
        observations: Vec<PriceObservation>,
    ) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(AnalysisError::InvalidData("empty symbol".to_string()));
        }

        for (i, obs) in observations.iter().enumerate() {
            if !obs.close.is_finite() || obs.close <= 0.0 {
                return Err(AnalysisError::InvalidData(format!(
                    "{}: close {} on {} is not a positive price",
                    symbol, obs.close, obs.date
                )));
            }
            if i > 0 && obs.date <= observations[i - 1].date {
                return Err(AnalysisError::InvalidData(format!(
                    "{}: dates not strictly increasing at {}",
                    symbol, obs.date
                )));
            }
        }

        Ok(Self { symbol, observations })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn latest(&self) -> Option<&PriceObservation> {
        self.observations.last()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Simple moving average aligned to the tail of its source series.
///
/// `values[i]` belongs to observation `period - 1 + i`, so the last value is
/// always the moving average at the latest date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageSeries {
    pub period: usize,
    pub values: Vec<f64>,
}

impl MovingAverageSeries {
    pub fn empty(period: usize) -> Self {
        Self { period, values: Vec::new() }
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Value one observation before the latest.
    pub fn previous(&self) -> Option<f64> {
        self.back(1)
    }

    /// Value `n` observations before the latest.
    pub fn back(&self, n: usize) -> Option<f64> {
        self.values
            .len()
            .checked_sub(n + 1)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Direction of a moving average over a lookback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlopeClassification {
    Rising,
    Flat,
    Falling,
}

impl SlopeClassification {
    pub fn to_label(&self) -> &'static str {
        match self {
            SlopeClassification::Rising => "rising",
            SlopeClassification::Flat => "flat",
            SlopeClassification::Falling => "falling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ExitRisk,
    EntryOpportunity,
}

impl AlertKind {
    /// Label used in notification headers
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::ExitRisk => "EXIT RISK",
            AlertKind::EntryOpportunity => "ENTRY OPPORTUNITY",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertKind::ExitRisk => "🚨",
            AlertKind::EntryOpportunity => "🟢",
        }
    }

    /// Stable identifier, matches the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            AlertKind::ExitRisk => "EXIT_RISK",
            AlertKind::EntryOpportunity => "ENTRY_OPPORTUNITY",
        }
    }
}

/// A fired rule, ready for the notifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub symbol: String,
    pub reason: String,
    pub price: f64,
    pub date: NaiveDate,
}

impl AlertRecord {
    pub fn new(
        kind: AlertKind,
        symbol: impl Into<String>,
        reason: impl Into<String>,
        price: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            reason: reason.into(),
            price,
            date,
        }
    }
}
