//! Alert Aggregator
//!
//! Runs both rule families for every symbol in a watchlist and collects the
//! fired alerts in watchlist order. One symbol failing never stops the run.

use analysis_core::{AlertKind, AlertRecord, AnalysisError, PriceHistoryProvider, PriceSeries};
use serde::Serialize;

use crate::config::RuleConfig;
use crate::entry_opportunity::EntryOpportunityEvaluator;
use crate::exit_risk::ExitRiskEvaluator;
use crate::overview::{sort_by_quarter_drop, SymbolOverview};
use crate::snapshot::IndicatorSnapshot;
use crate::watchlist::Watchlist;

/// A symbol that produced no evaluation and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of one watchlist run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<AlertRecord>,
    pub evaluated: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
    /// Status of every symbol with enough history, in watchlist order
    pub overview: Vec<SymbolOverview>,
}

impl AlertReport {
    pub fn exit_risks(&self) -> usize {
        self.count(AlertKind::ExitRisk)
    }

    pub fn entry_opportunities(&self) -> usize {
        self.count(AlertKind::EntryOpportunity)
    }

    /// Overview rows with the deepest three-month drop first.
    pub fn overview_by_drop(&self) -> Vec<SymbolOverview> {
        let mut rows = self.overview.clone();
        sort_by_quarter_drop(&mut rows);
        rows
    }

    fn count(&self, kind: AlertKind) -> usize {
        self.alerts.iter().filter(|a| a.kind == kind).count()
    }
}

pub struct AlertAggregator {
    config: RuleConfig,
    exit_risk: ExitRiskEvaluator,
    entry: EntryOpportunityEvaluator,
}

impl AlertAggregator {
    pub fn new(config: RuleConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            exit_risk: ExitRiskEvaluator::new(&config),
            entry: EntryOpportunityEvaluator::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate one series. Exit risk comes first, then entry opportunity;
    /// the two are independent and may both fire.
    pub fn evaluate(&self, series: &PriceSeries) -> Vec<AlertRecord> {
        self.assess(series).map(|(alerts, _)| alerts).unwrap_or_default()
    }

    /// Alerts plus the overview row, or `None` when the series is too short
    /// for any rule to run.
    pub fn assess(&self, series: &PriceSeries) -> Option<(Vec<AlertRecord>, SymbolOverview)> {
        let snapshot = match IndicatorSnapshot::compute(series, &self.config) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::info!("Skipping rules for {}: {}", series.symbol(), e);
                return None;
            }
        };

        let alerts: Vec<AlertRecord> = self
            .exit_risk
            .evaluate(series, &snapshot)
            .into_iter()
            .chain(self.entry.evaluate(series, &snapshot))
            .collect();
        let overview = SymbolOverview::build(series, &snapshot, &alerts);

        Some((alerts, overview))
    }

    /// Fetch and evaluate every symbol in order.
    pub async fn run(&self, watchlist: &Watchlist, provider: &dyn PriceHistoryProvider) -> AlertReport {
        let mut report = AlertReport::default();

        for symbol in watchlist.iter() {
            let series = match provider.fetch_daily_closes(symbol).await {
                Ok(series) => series,
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", symbol, e);
                    report.skipped.push(SkippedSymbol {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            report.evaluated.push(symbol.to_string());
            let Some((alerts, overview)) = self.assess(&series) else {
                continue;
            };

            for alert in &alerts {
                tracing::info!("{} {} {}: {}", alert.kind.emoji(), alert.kind.code(), alert.symbol, alert.reason);
            }
            report.alerts.extend(alerts);
            report.overview.push(overview);
        }

        tracing::info!(
            "Evaluated {} of {} symbols: {} exit risk, {} entry opportunity",
            report.evaluated.len(),
            watchlist.len(),
            report.exit_risks(),
            report.entry_opportunities()
        );

        report
    }
}
