//! Verification outcome.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::browser::{BrowserError, ConsentOutcome};
use crate::config::ConfigError;
use crate::gateway::{Greeting, ProbeError};
use crate::resilience::PollError;
use crate::traces::{MatchedServices, TraceQueryError};

/// What a passing run observed.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub run_id: Uuid,
    pub greeting: Greeting,
    /// `None` when traces were queried directly, without the UI login.
    pub consent: Option<ConsentOutcome>,
    pub query_url: String,
    pub attempts: u32,
    pub elapsed: Duration,
    pub services: MatchedServices,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {}: PASSED", self.run_id)?;
        writeln!(f, "  greeting: {}", self.greeting.content)?;
        if let Some(consent) = self.consent {
            writeln!(f, "  login consent: {:?}", consent)?;
        }
        writeln!(f, "  traces: {} attempt(s) in {:?}", self.attempts, self.elapsed)?;
        for (name, service) in &self.services.matches {
            writeln!(f, "  {} -> {}", name, service)?;
        }
        Ok(())
    }
}

/// Errors that fail a verification run.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("gateway probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("browser session failed: {0}")]
    Browser(#[source] BrowserError),

    #[error("login failed: {0}")]
    Login(#[source] BrowserError),

    #[error("trace query failed: {0}")]
    Query(#[from] TraceQueryError),

    #[error("traces not captured: {0}")]
    Traces(#[from] PollError<TraceQueryError>),
}
