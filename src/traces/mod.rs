//! Trace query subsystem.
//!
//! # Data Flow
//! ```text
//! query.rs (URL with service + start filter)
//!     → source.rs (browser session or direct HTTP)
//!     → types.rs (TraceQueryResponse)
//!     → predicate.rs (expected services present?)
//!     → resilience::poll (retry until satisfied or deadline)
//! ```

pub mod predicate;
pub mod query;
pub mod source;
pub mod types;

pub use predicate::{ExpectedServices, MatchedServices};
pub use query::TraceQuery;
pub use source::{wait_for_services, BrowserSource, HttpSource, TraceFetch, TraceSource};
pub use types::{Process, TraceQueryError, TraceQueryResponse, TraceRecord};
