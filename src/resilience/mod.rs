//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Trace poll:
//!     → poll.rs (attempt, evaluate, stop on success or deadline)
//!     → backoff.rs (delay between attempts, exponential + jitter)
//! ```
//!
//! # Design Decisions
//! - Every wait has a deadline; no attempt outlives the budget
//! - Only the most recent failure is reported

pub mod backoff;
pub mod poll;

pub use poll::{poll_until, Attempt, Failure, Fetch, PollError, PollPolicy, PollState, PollSuccess};
