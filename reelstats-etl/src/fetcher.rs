//! Catalog fetcher
//!
//! Looks up movie details, with credits appended, for a list of identifiers.
//! Every failure is recorded against its identifier and iteration
//! continues; [`fetch_all`] itself never fails.
//!
//! Requests are rate limited, and transient failures (HTTP 429 and 5xx
//! gateway statuses, transport errors) are retried with exponential
//! backoff.

use crate::models::RawMovie;
use async_trait::async_trait;
use reelstats_common::config::ApiConfig;
use serde_json::Value;
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("reelstats/", env!("CARGO_PKG_VERSION"));

/// Sub-resource appended to every details lookup
const APPEND_TO_RESPONSE: &str = "credits";

/// Statuses worth retrying
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Fetch errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Identifier cannot exist in the catalog; no request was made
    #[error("Invalid movie id: {0}")]
    InvalidId(i64),

    /// Transport failure (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Catalog has no movie with this id
    #[error("Movie not found: {0}")]
    NotFound(i64),

    /// Any other non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Body was not a JSON object carrying the requested id
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP client could not be built
    #[error("Client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether another attempt might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Api(status, _) => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }
}

/// Source of raw movie records
///
/// Implemented by [`TmdbClient`]; tests drive [`fetch_all`] through a fake.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Details of one movie, credits included
    async fn movie_details(&self, id: i64) -> Result<RawMovie, FetchError>;
}

/// Exponential backoff settings
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: f64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `base * factor^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.factor.powi(exponent);
        if millis.is_finite() && millis >= 0.0 {
            Duration::from_millis(millis.round() as u64)
        } else {
            self.base_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(config: &ApiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            factor: config.backoff_factor,
        }
    }
}

/// Run `operation`, retrying transient failures per `policy`
///
/// Non-transient errors are returned immediately. After the last retry the
/// final error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    movie_id: i64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(movie_id, retries = attempt, "Lookup succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    movie_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient lookup failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

type DirectRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// TMDB v3 client
pub struct TmdbClient {
    http_client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl TmdbClient {
    /// Build a client from resolved connection settings
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api: &ApiConfig,
    ) -> Result<Self, FetchError> {
        Self::with_builder(reqwest::Client::builder(), base_url, api_key, api)
    }

    fn with_builder(
        builder: reqwest::ClientBuilder,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api: &ApiConfig,
    ) -> Result<Self, FetchError> {
        let http_client = builder
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let per_second = NonZeroU32::new(api.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = governor::RateLimiter::direct(governor::Quota::per_second(per_second));

        Ok(Self {
            http_client,
            rate_limiter,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::from(api),
        })
    }

    /// Details endpoint for `id`, without query parameters
    pub fn endpoint(&self, id: i64) -> String {
        format!("{}/movie/{}", self.base_url, id)
    }

    async fn request_once(&self, id: i64) -> Result<RawMovie, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = self.endpoint(id);
        debug!(movie_id = id, url = %url, "Querying catalog");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", APPEND_TO_RESPONSE),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        parse_details(&body, id)
    }
}

/// Decode the details body returned for `requested_id`
///
/// Anything but a JSON object whose `id` equals `requested_id` is a parse
/// error.
pub fn parse_details(body: &str, requested_id: i64) -> Result<RawMovie, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    let record = RawMovie::from_value(value)
        .ok_or_else(|| FetchError::Parse("response body is not a JSON object".to_string()))?;
    expect_id(record, requested_id)
}

fn expect_id(record: RawMovie, requested_id: i64) -> Result<RawMovie, FetchError> {
    match record.id() {
        Some(id) if id == requested_id => Ok(record),
        Some(id) => Err(FetchError::Parse(format!(
            "response carries id {} instead of {}",
            id, requested_id
        ))),
        None => Err(FetchError::Parse("response has no usable id".to_string())),
    }
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn movie_details(&self, id: i64) -> Result<RawMovie, FetchError> {
        if id <= 0 {
            return Err(FetchError::InvalidId(id));
        }
        with_retry(&self.retry, id, || self.request_once(id)).await
    }
}

/// One identifier that produced no record
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub id: i64,
    pub reason: FetchError,
}

/// Result of [`fetch_all`]
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successful records, in request order
    pub records: Vec<RawMovie>,
    pub failures: Vec<FetchFailure>,
}

/// Fetch every id sequentially
///
/// Ids `<= 0` fail locally with [`FetchError::InvalidId`] and never reach
/// the client. A record whose `id` differs from the one requested counts
/// as a [`FetchError::Parse`] failure. Zero successful records is a valid
/// outcome.
pub async fn fetch_all<C>(client: &C, ids: &[i64]) -> FetchOutcome
where
    C: CatalogClient + ?Sized,
{
    let mut outcome = FetchOutcome::default();

    for &id in ids {
        let result = if id <= 0 {
            Err(FetchError::InvalidId(id))
        } else {
            client
                .movie_details(id)
                .await
                .and_then(|record| expect_id(record, id))
        };

        match result {
            Ok(record) => {
                let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("?");
                info!(movie_id = id, title, "Fetched movie");
                outcome.records.push(record);
            }
            Err(reason) => {
                warn!(movie_id = id, error = %reason, "Fetch failed");
                outcome.failures.push(FetchFailure { id, reason });
            }
        }
    }

    info!(
        requested = ids.len(),
        fetched = outcome.records.len(),
        failed = outcome.failures.len(),
        "Fetch complete"
    );
    outcome
}
