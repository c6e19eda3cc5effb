mod dedupe;
mod telegram;
mod templates;

pub use dedupe::AlertLedger;
pub use telegram::TelegramNotifier;
pub use templates::MessageTemplate;

use std::path::PathBuf;

use analysis_core::AlertRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &AlertRecord) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Telegram error: {0}")]
    Telegram(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Alert state error: {0}")]
    State(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
    pub state_dir: PathBuf,
    pub dedupe_days: i64,
    pub retention_days: i64,
    pub max_messages_per_run: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: "https://api.telegram.org".to_string(),
            state_dir: PathBuf::from("state"),
            dedupe_days: 3,
            retention_days: 30,
            max_messages_per_run: 10,
        }
    }
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty_var("TELEGRAM_CHAT_ID"),
            telegram_api_url: non_empty_var("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),
            state_dir: non_empty_var("ALERT_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            dedupe_days: parsed_var("ALERT_DEDUPE_DAYS").unwrap_or(defaults.dedupe_days),
            retention_days: parsed_var("ALERT_RETENTION_DAYS").unwrap_or(defaults.retention_days),
            max_messages_per_run: parsed_var("MAX_MESSAGES_PER_RUN")
                .unwrap_or(defaults.max_messages_per_run),
        }
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty_var(name).and_then(|s| s.trim().parse().ok())
}

/// What happened to each alert handed to [`NotificationService::dispatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    /// Already delivered inside the dedupe window
    pub suppressed: usize,
    pub failed: usize,
    /// Dropped by the per-run message cap
    pub capped: usize,
}

/// Delivers alerts to every configured channel.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
    max_messages_per_run: usize,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.telegram_configured() {
            match TelegramNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!("Telegram notifications enabled");
                    channels.push(Box::new(notifier));
                }
                Err(e) => tracing::warn!("Failed to initialize Telegram notifier: {}", e),
            }
        } else {
            tracing::warn!(
                "Telegram credentials not configured (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID); alerts will not be sent"
            );
        }

        Self::with_channels(channels, config.max_messages_per_run)
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>, max_messages_per_run: usize) -> Self {
        Self {
            channels,
            max_messages_per_run,
        }
    }

    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Send each alert not already in the ledger, up to the per-run cap.
    /// An alert counts as sent when at least one channel accepts it, and only
    /// sent alerts are recorded. Old ledger entries are pruned afterwards.
    pub async fn dispatch(
        &self,
        alerts: &[AlertRecord],
        ledger: &mut AlertLedger,
        now: DateTime<Utc>,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        if !self.has_channels() {
            tracing::warn!("No notification channels available, {} alerts not sent", alerts.len());
            return summary;
        }

        for alert in alerts {
            if !ledger.should_send(alert, now) {
                tracing::info!("Suppressing repeat {} for {}", alert.kind.code(), alert.symbol);
                summary.suppressed += 1;
                continue;
            }

            if summary.sent >= self.max_messages_per_run {
                summary.capped += 1;
                continue;
            }

            let mut delivered = false;
            for channel in &self.channels {
                match channel.send(alert).await {
                    Ok(()) => {
                        tracing::debug!("Sent {} for {} via {}", alert.kind.code(), alert.symbol, channel.name());
                        delivered = true;
                    }
                    Err(e) => tracing::warn!(
                        "Failed to send {} for {} via {}: {}",
                        alert.kind.code(),
                        alert.symbol,
                        channel.name(),
                        e
                    ),
                }
            }

            if delivered {
                ledger.record(alert, now);
                summary.sent += 1;
            } else {
                summary.failed += 1;
            }
        }

        if summary.capped > 0 {
            tracing::warn!(
                "Message cap of {} reached, {} alerts held back",
                self.max_messages_per_run,
                summary.capped
            );
        }

        let pruned = ledger.prune(now);
        if pruned > 0 {
            tracing::debug!("Pruned {} expired ledger entries", pruned);
        }

        summary
    }
}
