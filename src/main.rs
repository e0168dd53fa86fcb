//! Trace verifier (v1)
//!
//! Checks that a request through the ingress gateway produces traces for the
//! demo services.
//!
//! # Flow
//!
//! ```text
//!   ┌──────────────┐   GET /api/greeting    ┌─────────────────┐
//!   │              │───────────────────────▶│ ingress gateway │──▶ greeting ──▶ cute-name
//!   │              │                        └─────────────────┘        │            │
//!   │   verifier   │                                                    ▼            ▼
//!   │              │   WebDriver: login,    ┌─────────────────┐    ┌──────────────────────┐
//!   │              │── GET /api/traces ────▶│  trace query UI │◀───│   tracing backend    │
//!   └──────────────┘   (poll ≤ 20s)         └─────────────────┘    └──────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use trace_verifier::config::{load_config, validate_config, ConfigError, TraceSourceKind, VerifierConfig};
use trace_verifier::observability::{logging, metrics};
use trace_verifier::Verifier;

#[derive(Parser)]
#[command(name = "trace-verifier")]
#[command(about = "Verify that gateway traffic shows up as traces for the demo services", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ingress gateway base URL.
    #[arg(long, env = "GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Trace query base URL.
    #[arg(long, env = "JAEGER_QUERY_URL")]
    jaeger_url: Option<String>,

    /// WebDriver endpoint.
    #[arg(long, env = "WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Query the trace API over plain HTTP instead of through the browser.
    #[arg(long)]
    direct: bool,

    /// Trace poll budget in seconds.
    #[arg(long)]
    max_wait_secs: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn into_config(self) -> Result<VerifierConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => VerifierConfig::default(),
        };

        if let Some(url) = self.gateway_url {
            config.gateway.base_url = url;
        }
        if let Some(url) = self.jaeger_url {
            config.jaeger.base_url = url;
        }
        if let Some(url) = self.webdriver_url {
            config.browser.webdriver_url = url;
        }
        if self.direct {
            config.jaeger.source = TraceSourceKind::Direct;
        }
        if let Some(secs) = self.max_wait_secs {
            config.poll.max_wait_secs = secs;
        }
        if self.json_logs {
            config.observability.json = true;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("trace-verifier v0.1.0 starting");
    tracing::info!(
        gateway = %config.gateway.base_url,
        jaeger = %config.jaeger.base_url,
        source = ?config.jaeger.source,
        max_wait_secs = config.poll.max_wait_secs,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    match Verifier::new(config).run().await {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
