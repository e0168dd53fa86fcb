//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probe, login and poll loop produce:
//!     → logging.rs (structured log events, one span per run)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing in CI
//! - Run ID flows through every event of a run
//! - Metrics exporter is opt-in; the facade is a no-op without it

pub mod logging;
pub mod metrics;
