use analysis_core::AlertRecord;

/// Plain-text alert message for chat delivery.
pub struct MessageTemplate;

impl MessageTemplate {
    pub fn render(alert: &AlertRecord) -> String {
        format!(
            "{} {}\nSymbol: {}\nReason: {}\nPrice: {:.2}\nDate: {}",
            alert.kind.emoji(),
            alert.kind.label(),
            alert.symbol,
            alert.reason,
            alert.price,
            alert.date.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::AlertKind;
    use chrono::NaiveDate;

    #[test]
    fn test_exit_risk_message() {
        let alert = AlertRecord::new(
            AlertKind::ExitRisk,
            "AAPL",
            "Drawdown 10.4% from 63-day high of 25.46",
            22.81,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        );

        assert_eq!(
            MessageTemplate::render(&alert),
            "🚨 EXIT RISK\nSymbol: AAPL\nReason: Drawdown 10.4% from 63-day high of 25.46\nPrice: 22.81\nDate: 2024-03-08"
        );
    }

    #[test]
    fn test_entry_message_rounds_price() {
        let alert = AlertRecord::new(
            AlertKind::EntryOpportunity,
            "MSFT",
            "Pullback 6.2%",
            188.304,
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        );

        let message = MessageTemplate::render(&alert);
        assert!(message.starts_with("🟢 ENTRY OPPORTUNITY\n"));
        assert!(message.contains("\nPrice: 188.30\n"));
        assert!(message.ends_with("Date: 2024-11-01"));
    }
}
