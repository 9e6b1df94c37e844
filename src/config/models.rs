use crate::fetch::{FetchSettings, HttpConfig, RetryPolicy};
use crate::humanize::HumanDuration;
use crate::storage::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream generation API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_wind_path")]
    pub wind_path: String,
    #[serde(default = "default_solar_path")]
    pub solar_path: String,
    /// API key (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ApiConfig {
    /// `{base_url}/{path}?api_key={api_key}`, keeping both placeholders for the fetcher
    pub fn url_template(&self, path: &str) -> String {
        format!(
            "{}/{}?api_key={{api_key}}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            wind_path: default_wind_path(),
            solar_path: default_solar_path(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_wind_path() -> String {
    "{date}/renewables/windgen.csv".to_string()
}

fn default_solar_path() -> String {
    "{date}/renewables/solargen.json".to_string()
}

/// Backoff for rate-limited responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff: HumanDuration,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.backoff_multiplier)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            initial_backoff: self.initial_backoff.as_duration(),
            max_retries: self.max_retries,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: default_initial_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_initial_backoff() -> HumanDuration {
    HumanDuration::from_secs(1)
}

fn default_backoff_multiplier() -> f64 {
    crate::fetch::retry::DEFAULT_BACKOFF_MULTIPLIER
}

fn default_max_retries() -> u32 {
    5
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: self.connect_timeout.as_duration(),
            request_timeout: self.request_timeout.as_duration(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("genfetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Where and how results are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Days before the end date covered when no start date is given
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output")
}

fn default_lookback_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.retry.initial_backoff.as_duration(), Duration::from_secs(1));
        assert_eq!(config.retry.backoff_multiplier, 1.5);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.http.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(config.output.format, OutputFormat::Parquet);
        assert_eq!(config.output.lookback_days, 7);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_url_template_joins_base_and_path() {
        let api = ApiConfig {
            base_url: "http://api.example/".to_string(),
            ..ApiConfig::default()
        };

        assert_eq!(
            api.url_template("/{date}/renewables/windgen.csv"),
            "http://api.example/{date}/renewables/windgen.csv?api_key={api_key}"
        );
    }

    #[test]
    fn test_retry_conversions() {
        let retry = RetryConfig {
            initial_backoff: HumanDuration::from_millis(250),
            backoff_multiplier: 2.0,
            max_retries: 3,
        };

        assert_eq!(retry.policy().multiplier(), 2.0);
        assert_eq!(
            retry.fetch_settings(),
            FetchSettings {
                initial_backoff: Duration::from_millis(250),
                max_retries: 3
            }
        );
    }
}
