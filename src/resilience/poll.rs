//! Bounded poll-until-satisfied loop.
//!
//! # States
//! ```text
//! Idle → Polling: first attempt starts
//! Polling → Polling: attempt unsatisfied (or errored, when retrying errors) and budget left
//! Polling → Satisfied: attempt satisfied
//! Polling → TimedOut: budget spent
//! ```
//!
//! The terminal states are the result of [`poll_until`]: `Ok` is `Satisfied`,
//! `Err(PollError::TimedOut)` is `TimedOut`.
//!
//! The loop is independent of what is being polled: the caller supplies a
//! [`Fetch`] action and a predicate over its documents, and gets back either
//! the satisfied value or the most recent failure.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{self, Instant};

use crate::config::PollConfig;
use crate::observability::metrics;

/// Timing and error policy for [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total wall-clock budget.
    pub max_wait: Duration,
    /// Delay after the first attempt; doubles per attempt.
    pub initial_interval: Duration,
    /// Cap on the delay between attempts.
    pub max_interval: Duration,
    /// Keep polling when an attempt returns an error.
    pub retry_on_error: bool,
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            max_wait: Duration::from_secs(config.max_wait_secs),
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            retry_on_error: config.retry_on_error,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

/// Result of evaluating the condition once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Condition holds; polling stops with this value.
    Satisfied(T),
    /// Condition does not hold yet; the diagnostic explains why.
    Unsatisfied(String),
}

/// Live state of a running poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

/// Why the most recent attempt did not succeed.
#[derive(Debug)]
pub enum Failure<E> {
    Unmet(String),
    Error(E),
    /// No attempt finished before the deadline.
    Cut,
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Unmet(diagnostic) => write!(f, "{}", diagnostic),
            Failure::Error(e) => write!(f, "attempt failed: {}", e),
            Failure::Cut => write!(f, "attempt did not finish before the deadline"),
        }
    }
}

/// Successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSuccess<T> {
    pub value: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Poll loop failure.
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// Budget spent without the condition holding.
    #[error("condition not met after {attempts} attempt(s) in {elapsed:?}: {last}")]
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        last: Failure<E>,
    },

    /// An attempt errored and the policy does not retry errors.
    #[error("polling aborted on attempt {attempts}: {error}")]
    Aborted { attempts: u32, error: E },
}

/// Tracks the loop state, attempt count and deadline.
#[derive(Debug)]
pub struct PollTracker {
    state: PollState,
    attempts: u32,
    started: Instant,
    deadline: Instant,
}

impl PollTracker {
    pub fn new(max_wait: Duration) -> Self {
        let started = Instant::now();
        Self {
            state: PollState::Idle,
            attempts: 0,
            started,
            deadline: started + max_wait,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether another attempt may start. The first attempt always may.
    pub fn may_attempt(&self) -> bool {
        self.attempts == 0 || !self.remaining().is_zero()
    }

    fn begin_attempt(&mut self) -> u32 {
        self.state = PollState::Polling;
        self.attempts += 1;
        self.attempts
    }
}

/// The action polled by [`poll_until`]: produce a fresh document per attempt.
#[async_trait]
pub trait Fetch: Send {
    type Document: Send;
    type Error: fmt::Display + Send;

    async fn fetch(&mut self) -> Result<Self::Document, Self::Error>;
}

/// Fetch and evaluate `predicate` until it reports [`Attempt::Satisfied`] or
/// the budget is spent.
///
/// Each fetch is bounded by the remaining budget, and the delay between
/// attempts grows exponentially up to `policy.max_interval` without ever
/// sleeping past the deadline.
pub async fn poll_until<F, T, P>(
    policy: &PollPolicy,
    fetch: &mut F,
    mut predicate: P,
) -> Result<PollSuccess<T>, PollError<F::Error>>
where
    F: Fetch + ?Sized,
    P: FnMut(&F::Document) -> Attempt<T>,
{
    let mut tracker = PollTracker::new(policy.max_wait);
    let mut last: Failure<F::Error> = Failure::Cut;

    while tracker.may_attempt() {
        let n = tracker.begin_attempt();
        metrics::record_poll_attempt();

        let budget = tracker.remaining().max(Duration::from_millis(1));
        match time::timeout(budget, fetch.fetch()).await {
            Ok(Ok(document)) => match predicate(&document) {
                Attempt::Satisfied(value) => {
                    tracing::info!(
                        attempt = n,
                        elapsed_ms = tracker.elapsed().as_millis() as u64,
                        "Condition satisfied"
                    );
                    return Ok(PollSuccess {
                        value,
                        attempts: n,
                        elapsed: tracker.elapsed(),
                    });
                }
                Attempt::Unsatisfied(diagnostic) => {
                    tracing::debug!(attempt = n, diagnostic = %diagnostic, "Condition not met yet");
                    last = Failure::Unmet(diagnostic);
                }
            },
            Ok(Err(error)) => {
                if !policy.retry_on_error {
                    tracing::error!(attempt = n, error = %error, "Attempt failed, not retrying");
                    return Err(PollError::Aborted { attempts: n, error });
                }
                tracing::warn!(attempt = n, error = %error, "Attempt failed, retrying");
                last = Failure::Error(error);
            }
            // An earlier diagnostic outranks a cut attempt.
            Err(_) => tracing::warn!(attempt = n, last = %last, "Attempt cut off by deadline"),
        }

        let remaining = tracker.remaining();
        if remaining.is_zero() {
            break;
        }
        time::sleep(policy.delay(n).min(remaining)).await;
    }

    tracing::warn!(
        attempts = tracker.attempts(),
        elapsed_ms = tracker.elapsed().as_millis() as u64,
        last = %last,
        "Condition not met before deadline"
    );
    Err(PollError::TimedOut {
        attempts: tracker.attempts(),
        elapsed: tracker.elapsed(),
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the attempt number, or an error for the listed attempts.
    struct Counter {
        calls: u32,
        failing: Vec<u32>,
    }

    impl Counter {
        fn new() -> Self {
            Self { calls: 0, failing: Vec::new() }
        }
    }

    #[async_trait]
    impl Fetch for Counter {
        type Document = u32;
        type Error = String;

        async fn fetch(&mut self) -> Result<u32, String> {
            self.calls += 1;
            if self.failing.contains(&self.calls) {
                Err(format!("malformed document on call {}", self.calls))
            } else {
                Ok(self.calls)
            }
        }
    }

    struct Hanging;

    /// Answers the first call at once, then hangs.
    struct StallsAfterFirst {
        calls: u32,
    }

    #[async_trait]
    impl Fetch for StallsAfterFirst {
        type Document = u32;
        type Error = String;

        async fn fetch(&mut self) -> Result<u32, String> {
            self.calls += 1;
            if self.calls > 1 {
                time::sleep(Duration::from_secs(30)).await;
            }
            Ok(self.calls)
        }
    }

    #[async_trait]
    impl Fetch for Hanging {
        type Document = ();
        type Error = String;

        async fn fetch(&mut self) -> Result<(), String> {
            time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn policy(max_wait_secs: u64) -> PollPolicy {
        PollPolicy {
            max_wait: Duration::from_secs(max_wait_secs),
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_millis(2000),
            retry_on_error: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_on_first_attempt() {
        let mut fetch = Counter::new();
        let result = poll_until(&policy(20), &mut fetch, |n| Attempt::Satisfied(*n * 7))
            .await
            .unwrap();

        assert_eq!(result.value, 7);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_on_third_attempt() {
        let mut fetch = Counter::new();
        let result = poll_until(&policy(20), &mut fetch, |n| {
            if *n < 3 {
                Attempt::Unsatisfied("empty".into())
            } else {
                Attempt::Satisfied(*n)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.value, 3);
        assert_eq!(result.attempts, 3);
        assert_eq!(fetch.calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_latest_diagnostic() {
        let started = Instant::now();
        let mut fetch = Counter::new();
        let err = poll_until(&policy(20), &mut fetch, |n| {
            Attempt::<()>::Unsatisfied(format!("attempt {} unmet", n))
        })
        .await
        .unwrap_err();

        let elapsed = started.elapsed();
        assert!(elapsed <= Duration::from_secs(20), "overran budget: {:?}", elapsed);

        match err {
            PollError::TimedOut { attempts, last, .. } => {
                assert!(attempts > 1);
                assert_eq!(attempts, fetch.calls);
                assert_eq!(last.to_string(), format!("attempt {} unmet", attempts));
            }
            other => panic!("unexpected: {}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_retried_by_default() {
        let mut fetch = Counter::new();
        fetch.failing = vec![1];
        let result = poll_until(&policy(20), &mut fetch, |_| Attempt::Satisfied(()))
            .await
            .unwrap();

        assert_eq!(result.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_abort_when_not_retrying() {
        let mut policy = policy(20);
        policy.retry_on_error = false;

        let mut fetch = Counter::new();
        fetch.failing = vec![1];
        let err = poll_until(&policy, &mut fetch, |_| Attempt::Satisfied(()))
            .await
            .unwrap_err();

        assert_eq!(fetch.calls, 1);
        assert!(matches!(err, PollError::Aborted { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_is_cut_at_deadline() {
        let started = Instant::now();
        let err = poll_until(&policy(2), &mut Hanging, |_| Attempt::Satisfied(()))
            .await
            .unwrap_err();

        assert!(started.elapsed() <= Duration::from_secs(2));
        match err {
            PollError::TimedOut { attempts, last, .. } => {
                assert_eq!(attempts, 1);
                assert!(matches!(last, Failure::Cut));
            }
            other => panic!("unexpected: {}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cut_attempt_keeps_previous_diagnostic() {
        let started = Instant::now();
        let mut fetch = StallsAfterFirst { calls: 0 };
        let err = poll_until(&policy(20), &mut fetch, |_| {
            Attempt::<()>::Unsatisfied("no service name containing \"cute-name\"".into())
        })
        .await
        .unwrap_err();

        assert!(started.elapsed() <= Duration::from_secs(20));
        match err {
            PollError::TimedOut { attempts, last, .. } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.to_string(), "no service name containing \"cute-name\"");
            }
            other => panic!("unexpected: {}", other),
        }
    }

    #[test]
    fn test_tracker_allows_first_attempt_with_zero_budget() {
        let mut tracker = PollTracker::new(Duration::ZERO);
        assert_eq!(tracker.state(), PollState::Idle);
        assert!(tracker.may_attempt());

        assert_eq!(tracker.begin_attempt(), 1);
        assert_eq!(tracker.state(), PollState::Polling);
        assert!(!tracker.may_attempt());
    }
}
