//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI flag overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → VerifierConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a run starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::VerifierConfig;
pub use schema::{
    BrowserConfig, ExpectedServicesConfig, GatewayConfig, JaegerConfig, ObservabilityConfig,
    PollConfig, TraceSourceKind,
};
pub use validation::{validate_config, ValidationError};
