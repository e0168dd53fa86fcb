//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs and value ranges (budget > 0, intervals ordered)
//! - Reject an empty expected-service fixture
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: VerifierConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::VerifierConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("poll.initial_interval_ms ({initial}) exceeds poll.max_interval_ms ({max})")]
    IntervalOrder { initial: u64, max: u64 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &VerifierConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "gateway.base_url", &config.gateway.base_url);
    check_url(&mut errors, "jaeger.base_url", &config.jaeger.base_url);
    check_url(&mut errors, "browser.webdriver_url", &config.browser.webdriver_url);

    if !config.gateway.greeting_path.starts_with('/') {
        errors.push(ValidationError::InvalidUrl {
            field: "gateway.greeting_path",
            value: config.gateway.greeting_path.clone(),
            reason: "path must start with '/'".to_string(),
        });
    }

    if config.gateway.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "gateway.timeout_secs" });
    }
    if config.jaeger.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "jaeger.timeout_secs" });
    }
    if config.browser.command_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "browser.command_timeout_secs" });
    }
    if config.poll.max_wait_secs == 0 {
        errors.push(ValidationError::Zero { field: "poll.max_wait_secs" });
    }
    if config.poll.initial_interval_ms == 0 {
        errors.push(ValidationError::Zero { field: "poll.initial_interval_ms" });
    }
    if config.poll.initial_interval_ms > config.poll.max_interval_ms {
        errors.push(ValidationError::IntervalOrder {
            initial: config.poll.initial_interval_ms,
            max: config.poll.max_interval_ms,
        });
    }

    if config.jaeger.service.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "jaeger.service" });
    }
    if config.expected.names.is_empty() {
        errors.push(ValidationError::Empty { field: "expected.names" });
    }
    if config.expected.names.iter().any(|n| n.is_empty()) {
        errors.push(ValidationError::Empty { field: "expected.names[]" });
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
