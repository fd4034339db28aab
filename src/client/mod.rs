//! Typed client for the NodePing REST API.
//!
//! Every logical request goes through the same pipeline: one wait on the
//! shared [`RateLimiter`], then up to `1 + max_retries` attempts with
//! exponential backoff and jitter between them. Only API answers with status
//! 429 or >= 500 are retried; everything else is returned immediately.
//!
//! ```ignore
//! use hemmer_provider_nodeping::client::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig {
//!     api_token: "token".to_string(),
//!     ..Default::default()
//! })?;
//! let checks = client.list_checks().await?;
//! ```

mod checks;
mod contacts;
mod error;
#[allow(missing_docs)]
pub mod models;
mod rate_limit;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

pub use error::ClientError;
pub use rate_limit::RateLimiter;

use models::ErrorResponse;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.nodeping.com/api/1";
/// Requests per second when none is configured.
pub const DEFAULT_RATE_LIMIT: f64 = 10.0;
/// Retries after the first attempt when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Backoff before the first retry.
pub const DEFAULT_RETRY_MIN_WAIT: Duration = Duration::from_secs(1);
/// Upper bound on the backoff before jitter.
pub const DEFAULT_RETRY_MAX_WAIT: Duration = Duration::from_secs(30);
/// Per-attempt HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`Client::new`]. Zero values and `None` select the defaults.
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// API token, sent as the basic-auth user name.
    pub api_token: String,
    /// Sub-account scope, sent as `?customerid=`.
    pub customer_id: Option<String>,
    /// Base URL; [`DEFAULT_BASE_URL`] when unset.
    pub base_url: Option<String>,
    /// Requests per second; non-positive selects [`DEFAULT_RATE_LIMIT`].
    pub rate_limit: f64,
    /// Retries after the first attempt; zero selects [`DEFAULT_MAX_RETRIES`].
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub retry_min_wait: Duration,
    /// Backoff cap.
    pub retry_max_wait: Duration,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Tags merged into every check plan.
    pub default_tags: Vec<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .field("max_retries", &self.max_retries)
            .field("retry_min_wait", &self.retry_min_wait)
            .field("retry_max_wait", &self.retry_max_wait)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("default_tags", &self.default_tags)
            .finish()
    }
}

/// NodePing API client.
///
/// Cloning is cheap: clones share the HTTP connection pool and the rate
/// limiter.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_token: Arc<str>,
    customer_id: Option<String>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    retry_min_wait: Duration,
    retry_max_wait: Duration,
    user_agent: String,
    default_tags: Arc<[String]>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("customer_id", &self.customer_id)
            .field("rate_limit", &self.limiter.rate())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client, applying defaults for unset settings.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = config
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url =
            Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base));
        }

        let rate_limit = if config.rate_limit > 0.0 {
            config.rate_limit
        } else {
            DEFAULT_RATE_LIMIT
        };
        let timeout = non_zero_or(config.timeout, DEFAULT_TIMEOUT);

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_token: Arc::from(config.api_token),
            customer_id: config.customer_id.filter(|id| !id.is_empty()),
            limiter: Arc::new(RateLimiter::new(rate_limit)),
            max_retries: if config.max_retries == 0 {
                DEFAULT_MAX_RETRIES
            } else {
                config.max_retries
            },
            retry_min_wait: non_zero_or(config.retry_min_wait, DEFAULT_RETRY_MIN_WAIT),
            retry_max_wait: non_zero_or(config.retry_max_wait, DEFAULT_RETRY_MAX_WAIT),
            user_agent: config
                .user_agent
                .filter(|ua| !ua.is_empty())
                .unwrap_or_else(|| {
                    format!("hemmer-provider-nodeping/{}", env!("CARGO_PKG_VERSION"))
                }),
            default_tags: config.default_tags.into(),
        })
    }

    /// A copy scoped to another customer id. `self` is left unchanged.
    pub fn with_customer_id(&self, customer_id: impl Into<String>) -> Self {
        let customer_id = customer_id.into();
        Self {
            customer_id: Some(customer_id).filter(|id| !id.is_empty()),
            ..self.clone()
        }
    }

    /// Customer id sent with every request, if any.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Tags merged into every check plan.
    pub fn default_tags(&self) -> &[String] {
        &self.default_tags
    }

    /// Backoff before retry number `attempt` (1-based), jitter included.
    pub(crate) fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let capped = (self.retry_min_wait.as_secs_f64() * 2f64.powi(exponent))
            .min(self.retry_max_wait.as_secs_f64());
        let jitter = rand::thread_rng().gen::<f64>() * 0.3 * capped;
        Duration::from_secs_f64(capped + jitter)
    }

    /// Send a request without a body.
    pub(crate) async fn call<T>(&self, method: Method, segments: &[&str]) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Default,
    {
        self.execute(method, segments, None).await
    }

    /// Send a request with a JSON body.
    pub(crate) async fn call_with_body<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        self.execute(method, segments, Some(body)).await
    }

    async fn execute<T>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.url(segments)?;

        self.limiter.acquire().await;

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let wait = self.backoff(attempt);
                debug!(
                    method = %method,
                    path = url.path(),
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "Retrying NodePing request"
                );
                tokio::time::sleep(wait).await;
            }

            match self.attempt(&method, &url, body.as_deref()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    warn!(
                        method = %method,
                        path = url.path(),
                        attempt,
                        error = %err,
                        "NodePing request failed, will retry"
                    );
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt<T>(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Default,
    {
        debug!(method = %method, path = url.path(), "Sending NodePing request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth(&*self.api_token, None::<&str>)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        if status >= 400 {
            return Err(api_error(status, &bytes));
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(customer_id) = &self.customer_id {
            url.query_pairs_mut().append_pair("customerid", customer_id);
        }
        Ok(url)
    }
}

fn non_zero_or(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

/// Prefer the `{"error": ...}` message, fall back to the raw body.
fn api_error(status: u16, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => String::from_utf8_lossy(body).into_owned(),
    };
    ClientError::Api { status, message }
}
