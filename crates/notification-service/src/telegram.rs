use analysis_core::AlertRecord;
use async_trait::async_trait;

use crate::templates::MessageTemplate;
use crate::{NotificationChannel, NotificationConfig, NotificationError};

pub struct TelegramNotifier {
    endpoint: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let token = config
            .telegram_bot_token
            .as_deref()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_BOT_TOKEN not set".into()))?;
        let chat_id = config
            .telegram_chat_id
            .as_deref()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_CHAT_ID not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotificationError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.telegram_api_url.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.to_string(),
            client,
        })
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn send(&self, alert: &AlertRecord) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": MessageTemplate::render(alert),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Telegram(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AlertKind;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_url: &str) -> NotificationConfig {
        NotificationConfig {
            telegram_bot_token: Some("123:abc".to_string()),
            telegram_chat_id: Some("42".to_string()),
            telegram_api_url: api_url.to_string(),
            ..Default::default()
        }
    }

    fn alert() -> AlertRecord {
        AlertRecord::new(
            AlertKind::ExitRisk,
            "AAPL",
            "Moving-average crossover",
            101.5,
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_posts_rendered_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "42",
                "text": "🚨 EXIT RISK\nSymbol: AAPL\nReason: Moving-average crossover\nPrice: 101.50\nDate: 2024-05-06",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config(&server.uri())).unwrap();
        notifier.send(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config(&server.uri())).unwrap();
        let err = notifier.send(&alert()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Telegram(ref msg) if msg.contains("chat not found")));
    }

    #[test]
    fn test_requires_credentials() {
        let missing = NotificationConfig { telegram_chat_id: None, ..config("http://localhost") };
        assert!(matches!(TelegramNotifier::new(&missing), Err(NotificationError::Config(_))));
    }
}
