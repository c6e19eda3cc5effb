//! Alert Engine
//!
//! Evaluates daily close histories against the exit-risk and
//! entry-opportunity rules and collects the fired alerts per watchlist run.

pub mod aggregator;
pub mod config;
pub mod entry_opportunity;
pub mod exit_risk;
pub mod overview;
pub mod snapshot;
pub mod watchlist;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{AlertAggregator, AlertReport, SkippedSymbol};
pub use config::RuleConfig;
pub use entry_opportunity::EntryOpportunityEvaluator;
pub use exit_risk::ExitRiskEvaluator;
pub use overview::{SymbolOverview, SymbolStatus, WindowDrop};
pub use snapshot::IndicatorSnapshot;
pub use watchlist::Watchlist;
