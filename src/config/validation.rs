use super::models::Config;
use thiserror::Error;

const DATE_PLACEHOLDER: &str = "{date}";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("api.base_url must not be empty")]
    EmptyBaseUrl,

    #[error("api.{field} must contain the {{date}} placeholder: '{value}'")]
    MissingDatePlaceholder { field: &'static str, value: String },

    #[error("retry.backoff_multiplier must be at least 1.0, got {0}")]
    InvalidBackoffMultiplier(f64),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_api(config)?;
    validate_retry(config)?;
    validate_http(config)?;
    Ok(())
}

fn validate_api(config: &Config) -> Result<(), ValidationError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ValidationError::EmptyBaseUrl);
    }

    for (field, value) in [
        ("wind_path", &config.api.wind_path),
        ("solar_path", &config.api.solar_path),
    ] {
        if !value.contains(DATE_PLACEHOLDER) {
            return Err(ValidationError::MissingDatePlaceholder {
                field,
                value: value.clone(),
            });
        }
    }

    Ok(())
}

fn validate_retry(config: &Config) -> Result<(), ValidationError> {
    let multiplier = config.retry.backoff_multiplier;
    if multiplier.is_nan() || multiplier < 1.0 {
        return Err(ValidationError::InvalidBackoffMultiplier(multiplier));
    }

    if config.retry.initial_backoff.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "retry.initial_backoff",
        });
    }

    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.request_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.request_timeout",
        });
    }

    Ok(())
}
