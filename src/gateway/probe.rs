//! Greeting endpoint probe.
//!
//! # Responsibilities
//! - Send one GET to the greeting endpoint through the ingress gateway
//! - Require HTTP 200 and a `content` field with the expected prefix
//!
//! # Design Decisions
//! - No retries: the gateway route is awaited before the run starts, so a
//!   failure here is a real failure
//! - The full body is kept in the error for the failure report

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::observability::metrics;

/// Body of `GET /api/greeting`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Greeting {
    pub content: String,
}

/// Errors that can occur while probing the gateway.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request could not be sent or the body could not be read.
    #[error("gateway request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Gateway answered with something other than 200.
    #[error("expected status 200 from {url}, got {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Body is not a greeting document.
    #[error("greeting body from {url} is not valid: {reason}: {body}")]
    Body {
        url: String,
        reason: String,
        body: String,
    },

    /// Greeting does not start with the expected prefix.
    #[error("expected greeting content starting with '{expected}', got '{actual}'")]
    Prefix { expected: String, actual: String },
}

/// One-shot probe of the greeting endpoint.
#[derive(Debug, Clone)]
pub struct GatewayProbe {
    client: Client,
    url: String,
    expected_prefix: String,
}

impl GatewayProbe {
    pub fn new(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.greeting_path
            ),
            expected_prefix: config.expected_prefix.clone(),
        }
    }

    /// Build a probe with its own client bounded by `config.timeout_secs`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ProbeError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self::new(client, config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the request and check the answer.
    pub async fn probe(&self) -> Result<Greeting, ProbeError> {
        let started = Instant::now();
        let result = self.send().await;
        metrics::record_probe(started.elapsed(), result.is_ok());

        match &result {
            Ok(greeting) => tracing::info!(
                url = %self.url,
                content = %greeting.content,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Gateway probe passed"
            ),
            Err(e) => tracing::error!(url = %self.url, error = %e, "Gateway probe failed"),
        }
        result
    }

    async fn send(&self) -> Result<Greeting, ProbeError> {
        let transport = |source| ProbeError::Transport {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if status != StatusCode::OK {
            return Err(ProbeError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let greeting: Greeting = serde_json::from_str(&body).map_err(|e| ProbeError::Body {
            url: self.url.clone(),
            reason: e.to_string(),
            body: body.clone(),
        })?;

        if !greeting.content.starts_with(&self.expected_prefix) {
            return Err(ProbeError::Prefix {
                expected: self.expected_prefix.clone(),
                actual: greeting.content,
            });
        }

        Ok(greeting)
    }
}
