//! Sent-alert ledger
//!
//! Remembers when each symbol/kind pair was last delivered so consecutive
//! runs do not repeat the same alert inside the dedupe window.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use analysis_core::AlertRecord;
use chrono::{DateTime, Duration, Utc};

use crate::NotificationError;

const LEDGER_FILE: &str = "alerts.json";

#[derive(Debug, Clone)]
pub struct AlertLedger {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Utc>>,
    dedupe_window: Duration,
    retention: Duration,
}

impl AlertLedger {
    /// Open `<state_dir>/alerts.json`. A missing file starts an empty ledger;
    /// an unreadable one is logged and replaced on the next save.
    pub fn load(
        state_dir: impl AsRef<Path>,
        dedupe_days: i64,
        retention_days: i64,
    ) -> Result<Self, NotificationError> {
        let path = state_dir.as_ref().join(LEDGER_FILE);

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt alert ledger {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(NotificationError::State(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            entries,
            dedupe_window: Duration::days(dedupe_days.max(0)),
            retention: Duration::days(retention_days.max(dedupe_days).max(0)),
        })
    }

    pub fn key(alert: &AlertRecord) -> String {
        format!("{}:{}", alert.symbol, alert.kind.code())
    }

    pub fn last_sent(&self, alert: &AlertRecord) -> Option<DateTime<Utc>> {
        self.entries.get(&Self::key(alert)).copied()
    }

    pub fn should_send(&self, alert: &AlertRecord, now: DateTime<Utc>) -> bool {
        match self.last_sent(alert) {
            Some(last) => now - last >= self.dedupe_window,
            None => true,
        }
    }

    pub fn record(&mut self, alert: &AlertRecord, now: DateTime<Utc>) {
        self.entries.insert(Self::key(alert), now);
    }

    /// Drop entries older than the retention window. Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let retention = self.retention;
        self.entries.retain(|_, sent| now - *sent < retention);
        before - self.entries.len()
    }

    pub fn save(&self) -> Result<(), NotificationError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                NotificationError::State(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| NotificationError::State(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| NotificationError::State(format!("cannot write {}: {}", self.path.display(), e)))?;

        tracing::debug!("Saved {} ledger entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AlertKind;
    use chrono::{NaiveDate, TimeZone};

    fn alert(symbol: &str, kind: AlertKind) -> AlertRecord {
        AlertRecord::new(kind, symbol, "reason", 10.0, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 21, 30, 0).unwrap()
    }

    #[test]
    fn test_suppresses_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = AlertLedger::load(dir.path(), 3, 30).unwrap();
        let exit = alert("AAPL", AlertKind::ExitRisk);

        assert!(ledger.should_send(&exit, at(3)));
        ledger.record(&exit, at(3));

        assert!(!ledger.should_send(&exit, at(4)));
        assert!(!ledger.should_send(&exit, at(5)));
        assert!(ledger.should_send(&exit, at(6)));
    }

    #[test]
    fn test_kinds_are_tracked_separately() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = AlertLedger::load(dir.path(), 3, 30).unwrap();
        ledger.record(&alert("AAPL", AlertKind::ExitRisk), at(3));

        assert!(ledger.should_send(&alert("AAPL", AlertKind::EntryOpportunity), at(3)));
        assert!(ledger.should_send(&alert("MSFT", AlertKind::ExitRisk), at(3)));
        assert_eq!(AlertLedger::key(&alert("AAPL", AlertKind::ExitRisk)), "AAPL:EXIT_RISK");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let exit = alert("NVDA", AlertKind::ExitRisk);

        let mut ledger = AlertLedger::load(&state_dir, 3, 30).unwrap();
        assert!(ledger.is_empty());
        ledger.record(&exit, at(3));
        ledger.save().unwrap();

        let reloaded = AlertLedger::load(&state_dir, 3, 30).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.last_sent(&exit), Some(at(3)));
        assert!(reloaded.path().ends_with("state/alerts.json"));
    }

    #[test]
    fn test_prune_drops_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = AlertLedger::load(dir.path(), 3, 10).unwrap();
        ledger.record(&alert("OLD", AlertKind::ExitRisk), at(1));
        ledger.record(&alert("NEW", AlertKind::ExitRisk), at(20));

        assert_eq!(ledger.prune(at(25)), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_sent(&alert("NEW", AlertKind::ExitRisk)).is_some());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alerts.json"), "not json").unwrap();

        let ledger = AlertLedger::load(dir.path(), 3, 30).unwrap();
        assert!(ledger.is_empty());
    }
}
