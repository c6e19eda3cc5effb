//! Per-symbol overview
//!
//! A status for every evaluated symbol, fired or not, plus how far the latest
//! close sits below its one-week, one-month and three-month highs.

use analysis_core::{AlertKind, AlertRecord, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use technical_analysis::{compute_drawdown, period_high};

use crate::snapshot::IndicatorSnapshot;

const WEEK: usize = 5;
const MONTH: usize = 21;
const QUARTER: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolStatus {
    ExitRisk,
    EntryOpportunity,
    /// Above the long average with the short average above it too
    Healthy,
    /// Above the long average, short average not confirming
    Watch,
    /// At or below the long average
    Wait,
}

impl SymbolStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolStatus::ExitRisk => "EXIT RISK",
            SymbolStatus::EntryOpportunity => "ENTRY OPP",
            SymbolStatus::Healthy => "HEALTHY",
            SymbolStatus::Watch => "WATCH",
            SymbolStatus::Wait => "WAIT",
        }
    }

    /// Fired alerts decide first, exit risk ahead of entry. Otherwise the
    /// latest close and the two averages decide.
    pub fn classify(snapshot: &IndicatorSnapshot, alerts: &[AlertRecord]) -> Self {
        if alerts.iter().any(|a| a.kind == AlertKind::ExitRisk) {
            return SymbolStatus::ExitRisk;
        }
        if alerts.iter().any(|a| a.kind == AlertKind::EntryOpportunity) {
            return SymbolStatus::EntryOpportunity;
        }

        match (snapshot.short_ma, snapshot.long_ma) {
            (Some(short), Some(long)) if snapshot.close > long && short > long => SymbolStatus::Healthy,
            (_, Some(long)) if snapshot.close > long => SymbolStatus::Watch,
            _ => SymbolStatus::Wait,
        }
    }
}

/// Drop (percent) from the trailing high of one window, with that high
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowDrop {
    pub drop_pct: f64,
    pub high: f64,
}

impl WindowDrop {
    /// `None` unless the series covers the whole window.
    pub fn compute(series: &PriceSeries, window: usize) -> Option<Self> {
        let drop_pct = compute_drawdown(series, window, window).ok()?;
        let high = period_high(series, window)?;
        Some(Self { drop_pct, high })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolOverview {
    pub symbol: String,
    pub status: SymbolStatus,
    pub price: f64,
    pub date: NaiveDate,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub week: Option<WindowDrop>,
    pub month: Option<WindowDrop>,
    pub quarter: Option<WindowDrop>,
}

impl SymbolOverview {
    pub fn build(series: &PriceSeries, snapshot: &IndicatorSnapshot, alerts: &[AlertRecord]) -> Self {
        Self {
            symbol: series.symbol().to_string(),
            status: SymbolStatus::classify(snapshot, alerts),
            price: snapshot.close,
            date: snapshot.date,
            short_ma: snapshot.short_ma,
            long_ma: snapshot.long_ma,
            week: WindowDrop::compute(series, WEEK),
            month: WindowDrop::compute(series, MONTH),
            quarter: WindowDrop::compute(series, QUARTER),
        }
    }

    /// Column titles lined up with [`SymbolOverview::table_row`].
    pub fn table_header() -> String {
        format_columns([
            "Symbol", "Status", "Price", "1W Drop", "1M Drop", "3M Drop", "1W High", "1M High", "3M High",
        ])
    }

    /// One fixed-width log line: status, price, then 1W/1M/3M drops and highs.
    pub fn table_row(&self) -> String {
        let drop_col = |w: Option<WindowDrop>| w.map_or_else(|| "-".to_string(), |w| format!("{:.1}%", w.drop_pct));
        let high_col = |w: Option<WindowDrop>| w.map_or_else(|| "-".to_string(), |w| format!("${:.2}", w.high));

        format_columns([
            self.symbol.as_str(),
            self.status.label(),
            &format!("${:.2}", self.price),
            &drop_col(self.week),
            &drop_col(self.month),
            &drop_col(self.quarter),
            &high_col(self.week),
            &high_col(self.month),
            &high_col(self.quarter),
        ])
    }
}

// ASCII only, so widths hold in a terminal
fn format_columns(cols: [&str; 9]) -> String {
    format!(
        "{:<8} {:<10} {:>10} {:>8} {:>8} {:>8} {:>10} {:>10} {:>10}",
        cols[0], cols[1], cols[2], cols[3], cols[4], cols[5], cols[6], cols[7], cols[8]
    )
}

/// Largest three-month drop first; symbols without one go last. Ties keep
/// their input order.
pub fn sort_by_quarter_drop(overview: &mut [SymbolOverview]) {
    overview.sort_by(|a, b| {
        let key = |o: &SymbolOverview| o.quarter.map(|q| q.drop_pct);
        match (key(a), key(b)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}
