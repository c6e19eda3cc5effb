//! investor-alert: Evaluate a watchlist once and send exit-risk and
//! entry-opportunity alerts to Telegram.
//!
//! Usage:
//!   cargo run -p investor-alert
//!   cargo run -p investor-alert -- --watchlist stocks.json --rules rules.json
//!   cargo run -p investor-alert -- --dry-run

use std::path::PathBuf;

use alert_engine::{AlertAggregator, AlertReport, RuleConfig, SymbolOverview, Watchlist};
use anyhow::{Context, Result};
use notification_service::{AlertLedger, NotificationConfig, NotificationService};
use polygon_client::PolygonClient;

const DEFAULT_WATCHLIST: &str = "stocks.json";

#[derive(Debug, PartialEq)]
struct CliArgs {
    watchlist: PathBuf,
    rules: Option<PathBuf>,
    dry_run: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Self {
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .filter(|v| !v.starts_with("--"))
                .map(PathBuf::from)
        };

        Self {
            watchlist: value_of("--watchlist").unwrap_or_else(|| PathBuf::from(DEFAULT_WATCHLIST)),
            rules: value_of("--rules"),
            dry_run: args.iter().any(|a| a == "--dry-run"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let cli = CliArgs::parse(&args);

    let watchlist = Watchlist::load(&cli.watchlist)
        .with_context(|| format!("loading watchlist {}", cli.watchlist.display()))?;

    let rules = match &cli.rules {
        Some(path) => RuleConfig::load(path).with_context(|| format!("loading rules {}", path.display()))?,
        None => RuleConfig::default(),
    };
    let aggregator = AlertAggregator::new(rules).context("invalid rule configuration")?;

    let api_key = std::env::var("POLYGON_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .context("POLYGON_API_KEY must be set")?;
    let mut client = PolygonClient::new(api_key);
    if let Some(days) = std::env::var("POLYGON_HISTORY_DAYS").ok().and_then(|v| v.parse().ok()) {
        client = client.with_history_days(days);
    }

    tracing::info!(
        "Evaluating {} symbols ({}-DMA / {}-DMA){}",
        watchlist.len(),
        aggregator.config().short_period,
        aggregator.config().long_period,
        if cli.dry_run { " [dry run]" } else { "" }
    );

    let report = aggregator.run(&watchlist, &client).await;

    tracing::info!(
        "Run complete: {} evaluated, {} skipped, {} exit risk, {} entry opportunity",
        report.evaluated.len(),
        report.skipped.len(),
        report.exit_risks(),
        report.entry_opportunities()
    );
    for skipped in &report.skipped {
        tracing::warn!("  skipped {}: {}", skipped.symbol, skipped.reason);
    }
    log_overview(&report);

    if report.alerts.is_empty() {
        tracing::info!("No alerts today");
        return Ok(());
    }

    if cli.dry_run {
        for alert in &report.alerts {
            tracing::info!("[dry run] would send:\n{}", notification_service::MessageTemplate::render(alert));
        }
        return Ok(());
    }

    let notify_config = NotificationConfig::from_env();
    let service = NotificationService::new(&notify_config);
    let mut ledger = AlertLedger::load(
        &notify_config.state_dir,
        notify_config.dedupe_days,
        notify_config.retention_days,
    )
    .context("loading alert ledger")?;

    let summary = service.dispatch(&report.alerts, &mut ledger, chrono::Utc::now()).await;
    tracing::info!(
        "Notifications: {} sent, {} suppressed, {} failed, {} capped",
        summary.sent,
        summary.suppressed,
        summary.failed,
        summary.capped
    );

    if service.has_channels() {
        ledger
            .save()
            .with_context(|| format!("saving alert ledger {}", ledger.path().display()))?;
    }

    Ok(())
}

fn log_overview(report: &AlertReport) {
    if report.overview.is_empty() {
        return;
    }

    tracing::info!("All symbols overview:");
    tracing::info!("{}", SymbolOverview::table_header());
    for row in report.overview_by_drop() {
        tracing::info!("{}", row.table_row());
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "investor_alert=info,alert_engine=info,notification_service=info".into());

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
