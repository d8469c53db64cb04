//! HTTP transport with fixed-interval retry for nicovideo.jp
//!
//! Every request goes through [`RetryPolicy::run`]: transport-level failures
//! are retried a bounded number of times with a fixed pause in between.
//! HTTP status codes are not inspected here; a 4xx/5xx body is returned to
//! the caller like any other.

use std::env;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, warn};

use crate::error::{NicovideoError, Result};
use crate::url::Endpoints;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default number of retries after the first attempt
pub const RETRY_COUNT: u32 = 5;

/// Pause between attempts for the login session transport
pub const SESSION_RETRY_WAIT: Duration = Duration::from_secs(5);

/// Pause between attempts for public, cookie-less requests
pub const PUBLIC_RETRY_WAIT: Duration = Duration::from_secs(3);

/// Something that can pause the current task
///
/// Injected into [`RetryPolicy`] so tests can observe the pauses without
/// waiting for them.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-interval retry policy
///
/// An operation is attempted at most `max_retries + 1` times. No jitter and
/// no backoff growth: every pause lasts exactly `interval`.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Pause between two attempts
    pub interval: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::public()
    }
}

impl RetryPolicy {
    /// Create a policy sleeping on the tokio timer
    ///
    /// # Arguments
    /// * `max_retries` - Retries after the first attempt
    /// * `interval` - Pause between two attempts
    pub fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Policy used by the login session: 5 retries, 5 seconds apart
    pub fn session() -> Self {
        Self::new(RETRY_COUNT, SESSION_RETRY_WAIT)
    }

    /// Policy used by public metadata and feed requests: 5 retries, 3 seconds apart
    pub fn public() -> Self {
        Self::new(RETRY_COUNT, PUBLIC_RETRY_WAIT)
    }

    /// Replaces the sleeper used between attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Same sleeper and interval, but a single attempt
    pub fn without_retries(&self) -> Self {
        Self {
            max_retries: 0,
            ..self.clone()
        }
    }

    /// Runs `operation` until it succeeds or the retries are exhausted
    ///
    /// Returns the first success, or the error of the last attempt.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "request failed, retrying in {:?}",
                        self.interval
                    );
                    self.sleeper.sleep(self.interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Retry policy of the cookie-bearing login session
    pub session_retry: RetryPolicy,
    /// Retry policy of public metadata and feed requests
    pub public_retry: RetryPolicy,
    /// Remote locations
    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: USER_AGENT.to_string(),
            session_retry: RetryPolicy::session(),
            public_retry: RetryPolicy::public(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration with overrides taken from the environment
    ///
    /// Reads `NICOVIDEO_TIMEOUT_SECS`, `NICOVIDEO_RETRY_COUNT`,
    /// `NICOVIDEO_RETRY_WAIT_SECS` and `NICOVIDEO_PUBLIC_RETRY_WAIT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retries = get_env_or_default("NICOVIDEO_RETRY_COUNT", RETRY_COUNT);
        let session_wait =
            get_env_or_default("NICOVIDEO_RETRY_WAIT_SECS", SESSION_RETRY_WAIT.as_secs());
        let public_wait =
            get_env_or_default("NICOVIDEO_PUBLIC_RETRY_WAIT_SECS", PUBLIC_RETRY_WAIT.as_secs());

        Self {
            timeout_secs: get_env_or_default("NICOVIDEO_TIMEOUT_SECS", defaults.timeout_secs),
            session_retry: RetryPolicy::new(retries, Duration::from_secs(session_wait)),
            public_retry: RetryPolicy::new(retries, Duration::from_secs(public_wait)),
            ..defaults
        }
    }

    /// Configuration pointing every endpoint at one origin
    pub fn with_base(base: &str) -> Self {
        Self {
            endpoints: Endpoints::with_base(base),
            ..Self::default()
        }
    }
}

fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: fmt::Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

/// HTTP client wrapper that retries every request
///
/// Clones share the same connection pool and cookie store.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Create a transport with its own cookie store
    ///
    /// # Arguments
    /// * `config` - Timeout and User-Agent source
    /// * `retry` - Policy applied to every request
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ClientConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()
            .map_err(NicovideoError::HttpError)?;

        Ok(Self { client, retry })
    }

    /// Same client and cookies, single attempt per request
    pub(crate) fn without_retries(&self) -> Self {
        Self {
            client: self.client.clone(),
            retry: self.retry.without_retries(),
        }
    }

    /// GET a page and return its body as text
    ///
    /// # Errors
    /// - `HttpError` - transport failure on every attempt
    pub async fn get(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        self.execute(|| self.client.get(url)).await
    }

    /// POST a form and return the response body as text
    ///
    /// # Errors
    /// - `HttpError` - transport failure on every attempt
    pub async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String> {
        debug!(url, "POST form");
        self.execute(|| self.client.post(url).form(form)).await
    }

    /// POST an already urlencoded body as is
    ///
    /// The delete API expects literal `[]` in its parameter names, which
    /// [`post_form`](Self::post_form) would percent-encode.
    ///
    /// # Arguments
    /// * `url` - Absolute request URL
    /// * `body` - `application/x-www-form-urlencoded` body
    pub async fn post_encoded(&self, url: &str, body: &str) -> Result<String> {
        debug!(url, "POST encoded");
        self.execute(|| {
            self.client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string())
        })
        .await
    }

    async fn execute<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let bytes = self
            .retry
            .run(|| {
                let request = build();
                async move { request.send().await?.bytes().await }
            })
            .await?;

        Ok(decode_text(&bytes))
    }
}

/// Decodes a body as UTF-8, dropping invalid byte sequences
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
