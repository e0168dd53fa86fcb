//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a verification run.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the trace verifier.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VerifierConfig {
    /// Ingress gateway probe settings.
    pub gateway: GatewayConfig,

    /// Trace query service settings.
    pub jaeger: JaegerConfig,

    /// Browser automation settings.
    pub browser: BrowserConfig,

    /// Trace poll loop settings.
    pub poll: PollConfig,

    /// Service names that must show up in the captured traces.
    pub expected: ExpectedServicesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ingress gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the gateway route (e.g., "http://gateway/thorntail-istio-tracing").
    pub base_url: String,

    /// Path of the greeting endpoint, relative to `base_url`.
    pub greeting_path: String,

    /// Literal the `content` field of the greeting must start with.
    pub expected_prefix: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            greeting_path: "/api/greeting".to_string(),
            expected_prefix: "Hello".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Trace query service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JaegerConfig {
    /// Base URL of the trace query route.
    pub base_url: String,

    /// Service the trace query is filtered on.
    pub service: String,

    /// Add a `start` filter so only traces from this run are returned.
    pub start_filter: bool,

    /// Tolerated clock skew between this host and the cluster, in seconds.
    pub clock_skew_secs: u64,

    /// How the trace document is fetched.
    pub source: TraceSourceKind,

    /// Skip TLS certificate validation for direct queries.
    pub accept_invalid_certs: bool,

    /// Request timeout for direct queries, in seconds.
    pub timeout_secs: u64,
}

impl Default for JaegerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:16686".to_string(),
            service: "istio-ingressgateway".to_string(),
            start_filter: true,
            clock_skew_secs: 1,
            source: TraceSourceKind::Browser,
            accept_invalid_certs: false,
            timeout_secs: 10,
        }
    }
}

/// Strategy for fetching the trace query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceSourceKind {
    /// Through the authenticated browser session.
    Browser,
    /// Plain HTTP GET, no UI login.
    Direct,
}

/// Browser automation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint (chromedriver, geckodriver, selenium).
    pub webdriver_url: String,

    /// Browser requested in the session capabilities.
    pub browser_name: String,

    /// Run the browser without a display.
    pub headless: bool,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Per-command timeout in seconds.
    pub command_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser_name: "chrome".to_string(),
            headless: true,
            username: "developer".to_string(),
            password: "developer".to_string(),
            command_timeout_secs: 5,
        }
    }
}

/// Trace poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Total wall-clock budget in seconds.
    pub max_wait_secs: u64,

    /// Delay before the second attempt in milliseconds.
    pub initial_interval_ms: u64,

    /// Upper bound on the delay between attempts in milliseconds.
    pub max_interval_ms: u64,

    /// Keep polling when an attempt fails to fetch or parse the document.
    pub retry_on_error: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: 20,
            initial_interval_ms: 500,
            max_interval_ms: 2000,
            retry_on_error: true,
        }
    }
}

/// Expected services fixture.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExpectedServicesConfig {
    /// Fragment every matching service name must contain.
    pub required_fragment: String,

    /// Names that must each be matched by at least one service.
    pub names: Vec<String>,
}

impl Default for ExpectedServicesConfig {
    fn default() -> Self {
        Self {
            required_fragment: "thorntail".to_string(),
            names: vec!["greeting".to_string(), "cute-name".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,

    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_address: None,
        }
    }
}
