//! Ingress gateway subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig (base URL, greeting path, expected prefix)
//!     → probe.rs (one GET, status + body checks)
//!     → Greeting or ProbeError (run stops before any trace polling)
//! ```

pub mod probe;

pub use probe::{GatewayProbe, Greeting, ProbeError};
