use analysis_core::{AnalysisError, PriceHistoryProvider, PriceObservation, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://api.polygon.io";
const MAX_ATTEMPTS: u32 = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Daily close history from the Polygon aggregates endpoint.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
    history_days: i64,
    retry_delay: Duration,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        // Default 500 req/min for Starter plan. Free tier users should set POLYGON_RATE_LIMIT=5.
        let rate_limit: usize = std::env::var("POLYGON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
            history_days: 365,
            retry_delay: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Calendar days of history requested per symbol.
    pub fn with_history_days(mut self, days: i64) -> Self {
        self.history_days = days.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(fetch_error)?;

        for attempt in 1..=MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::DataFetch("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(fetch_error)?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }
            if attempt == MAX_ATTEMPTS {
                break;
            }

            tracing::warn!(
                "Polygon 429 rate limited, waiting {}s before retry {}/{}",
                self.retry_delay.as_secs(),
                attempt,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(self.retry_delay).await;
        }

        Err(AnalysisError::DataFetch(format!(
            "Rate limited by Polygon after {} retries",
            MAX_ATTEMPTS
        )))
    }

    /// Adjusted daily closes for `symbol` between `from` and `to` inclusive,
    /// oldest first.
    pub async fn get_daily_closes(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            self.base_url,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::DataFetch(format!(
                "{}: HTTP {}: {}",
                symbol,
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::DataFetch(format!("{}: {}", symbol, e.without_url())))?;

        let observations = to_observations(agg_response.results);
        if observations.is_empty() {
            return Err(AnalysisError::DataFetch(format!("{}: no daily bars returned", symbol)));
        }

        tracing::debug!("Fetched {} daily closes for {}", observations.len(), symbol);
        PriceSeries::new(symbol, observations)
    }
}

#[async_trait]
impl PriceHistoryProvider for PolygonClient {
    async fn fetch_daily_closes(&self, symbol: &str) -> Result<PriceSeries, AnalysisError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(self.history_days);
        self.get_daily_closes(symbol, from, to).await
    }
}

/// The request URL carries the API key, so it never reaches the error text.
fn fetch_error(e: reqwest::Error) -> AnalysisError {
    AnalysisError::DataFetch(e.without_url().to_string())
}

/// Sorted by date with one close per day; the later bar wins on duplicates.
fn to_observations(results: Vec<AggregateResult>) -> Vec<PriceObservation> {
    let mut observations: Vec<PriceObservation> = results
        .into_iter()
        .filter_map(|r| {
            let date = DateTime::from_timestamp_millis(r.t)?.date_naive();
            Some(PriceObservation::new(date, r.c))
        })
        .collect();

    observations.sort_by_key(|o| o.date);
    let mut deduped: Vec<PriceObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        match deduped.last_mut() {
            Some(last) if last.date == obs.date => *last = obs,
            _ => deduped.push(obs),
        }
    }
    deduped
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp (ms)
    c: f64, // close
}
