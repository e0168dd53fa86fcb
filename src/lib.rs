//! End-to-end verifier for distributed tracing demos.
//!
//! Probes a greeting endpoint through the ingress gateway, logs in to the
//! trace query UI, and polls the trace query API until the expected services
//! show up in the captured traces.

pub mod browser;
pub mod config;
pub mod gateway;
pub mod observability;
pub mod resilience;
pub mod runner;
pub mod traces;

pub use config::schema::VerifierConfig;
pub use runner::{VerificationReport, Verifier, VerifyError};
