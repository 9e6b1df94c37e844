//! HTTP client for fetching one day of generation data

use chrono::NaiveDate;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};

use super::retry::{RetryPolicy, RetryState};
use super::{FetchError, FetchResult, Payload};
use crate::dates::DATE_FORMAT;

const DATE_PLACEHOLDER: &str = "{date}";
const API_KEY_PLACEHOLDER: &str = "{api_key}";
const REDACTED: &str = "***";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "genfetch/0.1.0".to_string(),
        }
    }
}

/// How a response is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    Csv,
    Json,
    RateLimited,
    Unauthorized,
    UnexpectedStatus(u16),
    UnexpectedContentType(String),
}

/// Classify a response by status and `Content-Type`.
///
/// Media type parameters such as `charset` are ignored.
pub fn classify(status: StatusCode, content_type: Option<&str>) -> ResponseClass {
    match status {
        StatusCode::OK => {
            let raw = content_type.unwrap_or_default();
            match raw.parse::<mime::Mime>() {
                Ok(media) if media.type_() == mime::TEXT && media.subtype() == mime::CSV => ResponseClass::Csv,
                Ok(media) if media.type_() == mime::APPLICATION && media.subtype() == mime::JSON => {
                    ResponseClass::Json
                }
                _ => ResponseClass::UnexpectedContentType(if raw.is_empty() {
                    "<missing>".to_string()
                } else {
                    raw.to_string()
                }),
            }
        }
        StatusCode::TOO_MANY_REQUESTS => ResponseClass::RateLimited,
        StatusCode::FORBIDDEN => ResponseClass::Unauthorized,
        other => ResponseClass::UnexpectedStatus(other.as_u16()),
    }
}

/// Fetches single dates. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    api_key: String,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher with its own connection pool
    pub fn new(config: &HttpConfig, api_key: impl Into<String>, policy: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self::with_client(client, api_key, policy))
    }

    /// Create a fetcher on an existing client
    pub fn with_client(client: Client, api_key: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Substitute the date and credential into the template
    pub fn render_url(&self, url_template: &str, date: NaiveDate) -> String {
        render(url_template, date, &self.api_key)
    }

    /// Fetch one date, retrying only while rate limited.
    ///
    /// Issues at most `max_retries + 1` requests.
    pub async fn fetch_one(
        &self,
        url_template: &str,
        date: NaiveDate,
        initial_backoff: Duration,
        max_retries: u32,
    ) -> Result<FetchResult, FetchError> {
        let mut state = RetryState::new(initial_backoff, max_retries);
        let mut attempts = 0u32;

        loop {
            let url = self.render_url(url_template, date);
            let safe_url = render(url_template, date, REDACTED);
            attempts += 1;

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    url: safe_url.clone(),
                    date,
                    source: source.without_url(),
                })?;

            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            match classify(status, content_type.as_deref()) {
                ResponseClass::Csv => {
                    let text = response.text().await.map_err(|e| FetchError::InvalidBody {
                        url: safe_url.clone(),
                        date,
                        message: e.without_url().to_string(),
                    })?;
                    debug!(url = %safe_url, attempts, size = text.len(), "Fetched CSV content");
                    return Ok(FetchResult::new(date, Payload::Csv(text)));
                }
                ResponseClass::Json => {
                    let text = response.text().await.map_err(|e| FetchError::InvalidBody {
                        url: safe_url.clone(),
                        date,
                        message: e.without_url().to_string(),
                    })?;
                    let value = serde_json::from_str(&text).map_err(|e| FetchError::InvalidBody {
                        url: safe_url.clone(),
                        date,
                        message: e.to_string(),
                    })?;
                    debug!(url = %safe_url, attempts, "Fetched JSON content");
                    return Ok(FetchResult::new(date, Payload::Json(value)));
                }
                ResponseClass::RateLimited => {
                    // Release the connection before sleeping
                    drop(response);

                    match state.advance(&self.policy) {
                        Some(delay) => {
                            debug!(
                                url = %safe_url,
                                attempts,
                                retries_left = state.retries_remaining,
                                delay_ms = delay.as_millis() as u64,
                                "Rate limited, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            warn!(url = %safe_url, attempts, "Rate limited, retries exhausted");
                            return Err(FetchError::RetriesExhausted {
                                url: safe_url,
                                date,
                                attempts,
                            });
                        }
                    }
                }
                ResponseClass::Unauthorized => {
                    return Err(FetchError::Unauthorized { url: safe_url, date });
                }
                ResponseClass::UnexpectedStatus(status) => {
                    return Err(FetchError::UnexpectedStatus {
                        url: safe_url,
                        date,
                        status,
                    });
                }
                ResponseClass::UnexpectedContentType(content_type) => {
                    return Err(FetchError::UnexpectedContentType {
                        url: safe_url,
                        date,
                        content_type,
                    });
                }
            }
        }
    }
}

fn render(url_template: &str, date: NaiveDate, api_key: &str) -> String {
    url_template
        .replace(DATE_PLACEHOLDER, &date.format(DATE_FORMAT).to_string())
        .replace(API_KEY_PLACEHOLDER, api_key)
}
