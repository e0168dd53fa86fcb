//! Verification procedure.
//!
//! # Data Flow
//! ```text
//! TraceQuery::from_config (start = now - skew, fixed before any traffic)
//!     → GatewayProbe::probe (once; failure ends the run)
//!     → browser source: WebDriver session → authenticate → poll → close
//!       direct source:  HTTP client → poll
//!     → VerificationReport or VerifyError
//! ```
//!
//! # Design Decisions
//! - The browser session is closed on every exit path; close errors are
//!   logged and never mask the run's own outcome
//! - Every event of a run carries its run ID

pub mod report;

use std::time::{Duration, SystemTime};

use tracing::Instrument;
use uuid::Uuid;

use crate::browser::{authenticate, Browser, ConsentOutcome, LoginForm, WebDriverBrowser};
use crate::config::{TraceSourceKind, VerifierConfig};
use crate::gateway::{GatewayProbe, Greeting};
use crate::observability::metrics;
use crate::resilience::{PollPolicy, PollSuccess};
use crate::traces::{wait_for_services, BrowserSource, ExpectedServices, HttpSource, MatchedServices, TraceQuery};

pub use report::{VerificationReport, VerifyError};

/// Runs the verification procedure for one configuration.
#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerifierConfig,
    expected: ExpectedServices,
    policy: PollPolicy,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        let expected = ExpectedServices::from_config(&config.expected);
        let policy = PollPolicy::from(&config.poll);
        Self {
            config,
            expected,
            policy,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run end to end, opening a WebDriver session when the browser source is configured.
    pub async fn run(&self) -> Result<VerificationReport, VerifyError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("verification", run_id = %run_id);
        let result = self.run_inner(run_id).instrument(span).await;
        record_outcome(&result);
        result
    }

    /// Run with a caller-supplied browser. The browser is closed before returning.
    pub async fn run_with_browser(&self, browser: &mut dyn Browser) -> Result<VerificationReport, VerifyError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("verification", run_id = %run_id);
        let result = async {
            let query = self.query()?;
            let greeting = self.probe_gateway().await?;
            self.browse(run_id, greeting, &mut *browser, &query).await
        }
        .instrument(span.clone())
        .await;
        close_browser(browser).instrument(span).await;
        record_outcome(&result);
        result
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<VerificationReport, VerifyError> {
        let query = self.query()?;
        let greeting = self.probe_gateway().await?;

        match self.config.jaeger.source {
            TraceSourceKind::Direct => {
                let timeout = Duration::from_secs(self.config.jaeger.timeout_secs);
                let mut source = HttpSource::from_config(&self.config.jaeger, timeout)?;
                let success = wait_for_services(&self.policy, &mut source, query.url(), &self.expected).await?;
                Ok(self.report(run_id, greeting, None, &query, success))
            }
            TraceSourceKind::Browser => {
                let mut browser = WebDriverBrowser::connect(&self.config.browser)
                    .await
                    .map_err(VerifyError::Browser)?;
                let result = self.browse(run_id, greeting, &mut browser, &query).await;
                close_browser(&mut browser).await;
                result
            }
        }
    }

    /// Trace query fixed at the start of the run.
    fn query(&self) -> Result<TraceQuery, VerifyError> {
        let query = TraceQuery::from_config(&self.config.jaeger, SystemTime::now())?;
        tracing::debug!(url = %query.url(), "Trace query prepared");
        Ok(query)
    }

    async fn probe_gateway(&self) -> Result<Greeting, VerifyError> {
        let probe = GatewayProbe::from_config(&self.config.gateway)?;
        Ok(probe.probe().await?)
    }

    /// Log in through the browser, then poll the trace query in the same session.
    async fn browse(
        &self,
        run_id: Uuid,
        greeting: Greeting,
        browser: &mut dyn Browser,
        query: &TraceQuery,
    ) -> Result<VerificationReport, VerifyError> {
        let url = query.url();
        let form = LoginForm::from_config(&self.config.browser);
        let consent = authenticate(browser, url.as_str(), &form)
            .await
            .map_err(VerifyError::Login)?;

        let mut source = BrowserSource::new(browser);
        let success = wait_for_services(&self.policy, &mut source, url, &self.expected).await?;
        Ok(self.report(run_id, greeting, Some(consent), query, success))
    }

    fn report(
        &self,
        run_id: Uuid,
        greeting: Greeting,
        consent: Option<ConsentOutcome>,
        query: &TraceQuery,
        success: PollSuccess<MatchedServices>,
    ) -> VerificationReport {
        VerificationReport {
            run_id,
            greeting,
            consent,
            query_url: query.url().to_string(),
            attempts: success.attempts,
            elapsed: success.elapsed,
            services: success.value,
        }
    }
}

async fn close_browser(browser: &mut dyn Browser) {
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "Failed to close browser session");
    }
}

fn record_outcome(result: &Result<VerificationReport, VerifyError>) {
    match result {
        Ok(report) => {
            metrics::record_run("passed");
            tracing::info!(
                run_id = %report.run_id,
                attempts = report.attempts,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Verification passed"
            );
        }
        Err(e) => {
            metrics::record_run("failed");
            tracing::error!(error = %e, "Verification failed");
        }
    }
}
