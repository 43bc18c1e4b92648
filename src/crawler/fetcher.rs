//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests returning the decoded page body
//! - Retry logic for transient failures
//! - Error classification (transient vs permanent)

use crate::config::{CrawlerConfig, SiteConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Body decoded as UTF-8, invalid sequences replaced
    pub body: String,
}

/// Failure of a fetch after the retry budget was applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Timeout, connection error or 5xx; retried before being reported
    #[error("transient failure for {url}: {reason}")]
    Transient {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// 4xx or malformed URL; reported immediately
    #[error("permanent failure for {url}: {reason}")]
    Permanent {
        url: String,
        status: Option<u16>,
        reason: String,
    },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } | Self::Permanent { status, .. } => *status,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }
}

/// Retry budget applied to transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retry_times: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            retry_times: config.retry_times,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Total attempts a single fetch may make
    pub fn max_attempts(&self) -> u32 {
        self.retry_times.saturating_add(1)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `site` - Site configuration providing the user agent
/// * `crawler` - Crawler configuration providing the per-request timeout
///
/// # Example
///
/// ```no_run
/// use directory_harvester::config::Config;
/// use directory_harvester::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.site, &config.crawler).unwrap();
/// ```
pub fn build_http_client(site: &SiteConfig, crawler: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.timeout_secs);

    Client::builder()
        .user_agent(site.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests under a retry policy
///
/// Cloning is cheap; the underlying client is reference counted.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn from_config(site: &SiteConfig, crawler: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(site, crawler)?,
            RetryPolicy::from_config(crawler),
        ))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Success |
    /// | 5xx, 408, 429 | Retry up to `retry_times`, then Transient |
    /// | Timeout, connection error | Retry up to `retry_times`, then Transient |
    /// | Other 4xx | Immediate Permanent |
    /// | Malformed URL | Immediate Permanent |
    pub async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Permanent {
            url: url.to_string(),
            status: None,
            reason: format!("malformed URL: {}", e),
        })?;

        let mut attempt = 1;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(fetched) => return Ok(fetched),
                Err(error) if error.is_transient() && attempt < self.retry.max_attempts() => {
                    tracing::debug!(
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        "Retrying after transient failure: {}",
                        error
                    );
                    attempt += 1;
                    if !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url.as_str(), status));
        }

        let final_url = response.url().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(url.as_str(), &e))?;

        Ok(Fetched {
            final_url,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Maps a non-success status to a fetch error
fn classify_status(url: &str, status: StatusCode) -> FetchError {
    let transient = status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS;

    let reason = format!("HTTP {}", status.as_u16());
    if transient {
        FetchError::Transient {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason,
        }
    } else {
        FetchError::Permanent {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason,
        }
    }
}

/// Maps a client error to a fetch error
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    let reason = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };

    if error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error.is_body()
        || error.is_decode()
    {
        FetchError::Transient {
            url: url.to_string(),
            status: None,
            reason,
        }
    } else {
        FetchError::Permanent {
            url: url.to_string(),
            status: error.status().map(|s| s.as_u16()),
            reason,
        }
    }
}
