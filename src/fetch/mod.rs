//! Concurrent fetch-with-retry engine
//!
//! - [`RetryPolicy`] / [`RetryState`] - backoff with jitter and the per-fetch budget
//! - [`Fetcher`] - one GET per date, response classification, 429 retries
//! - [`BatchFetcher`] - fans a [`DateRange`](crate::dates::DateRange) out and
//!   gathers results in date order

pub mod batch;
pub mod http;
pub mod retry;

pub use batch::BatchFetcher;
pub use http::{Fetcher, HttpConfig, ResponseClass, classify};
pub use retry::{RetryPolicy, RetryState};

use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Raw payload returned by the API for one date
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Csv(String),
    Json(serde_json::Value),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Csv(_) => "csv",
            Payload::Json(_) => "json",
        }
    }
}

/// Successful fetch for a single date
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub date: NaiveDate,
    pub payload: Payload,
}

impl FetchResult {
    pub fn new(date: NaiveDate, payload: Payload) -> Self {
        Self { date, payload }
    }
}

/// Permanent fetch failures. URLs never contain the credential.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API key is invalid for [{url}] ({date}), HTTP 403")]
    Unauthorized { url: String, date: NaiveDate },

    #[error("Failed to retrieve content for [{url}] ({date}), HTTP {status}")]
    UnexpectedStatus {
        url: String,
        date: NaiveDate,
        status: u16,
    },

    #[error("Unexpected content type '{content_type}' for [{url}] ({date})")]
    UnexpectedContentType {
        url: String,
        date: NaiveDate,
        content_type: String,
    },

    #[error("Max retries exceeded for [{url}] ({date}) after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        date: NaiveDate,
        attempts: u32,
    },

    #[error("Request to [{url}] ({date}) failed: {source}")]
    Transport {
        url: String,
        date: NaiveDate,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response body from [{url}] ({date}): {message}")]
    InvalidBody {
        url: String,
        date: NaiveDate,
        message: String,
    },

    #[error("Fetch task for {date} failed: {message}")]
    TaskFailed { date: NaiveDate, message: String },
}

impl FetchError {
    pub fn date(&self) -> NaiveDate {
        match self {
            FetchError::Unauthorized { date, .. }
            | FetchError::UnexpectedStatus { date, .. }
            | FetchError::UnexpectedContentType { date, .. }
            | FetchError::RetriesExhausted { date, .. }
            | FetchError::Transport { date, .. }
            | FetchError::InvalidBody { date, .. }
            | FetchError::TaskFailed { date, .. } => *date,
        }
    }
}

/// Retry parameters applied to every date of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub initial_backoff: Duration,
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_retries: 5,
        }
    }
}
