//! Trace document sources.
//!
//! # Responsibilities
//! - Fetch the raw trace query document for a URL
//! - Browser source: load the page in the logged-in session, unwrap the JSON viewer
//! - Direct source: plain HTTP GET, optionally with relaxed TLS validation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::browser::Browser;
use crate::config::JaegerConfig;
use crate::resilience::{poll_until, Fetch, PollError, PollPolicy, PollSuccess};
use crate::traces::predicate::{ExpectedServices, MatchedServices};
use crate::traces::types::{TraceQueryError, TraceQueryResponse};

/// Something that can fetch the trace query document.
#[async_trait]
pub trait TraceSource: Send {
    async fn fetch(&mut self, url: &Url) -> Result<String, TraceQueryError>;
}

/// Reads the document through a browser session.
pub struct BrowserSource<'a> {
    browser: &'a mut dyn Browser,
}

impl<'a> BrowserSource<'a> {
    pub fn new(browser: &'a mut dyn Browser) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl<'a> TraceSource for BrowserSource<'a> {
    async fn fetch(&mut self, url: &Url) -> Result<String, TraceQueryError> {
        self.browser.navigate(url.as_str()).await?;
        let source = self.browser.page_source().await?;
        Ok(extract_json(&source))
    }
}

/// Queries the trace API directly over HTTP.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &JaegerConfig, timeout: Duration) -> Result<Self, TraceQueryError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl TraceSource for HttpSource {
    async fn fetch(&mut self, url: &Url) -> Result<String, TraceQueryError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TraceQueryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// One trace query, fetched fresh on every poll attempt.
pub struct TraceFetch<'s> {
    source: &'s mut dyn TraceSource,
    url: Url,
}

impl<'s> TraceFetch<'s> {
    pub fn new(source: &'s mut dyn TraceSource, url: Url) -> Self {
        Self { source, url }
    }
}

#[async_trait]
impl<'s> Fetch for TraceFetch<'s> {
    type Document = TraceQueryResponse;
    type Error = TraceQueryError;

    async fn fetch(&mut self) -> Result<TraceQueryResponse, TraceQueryError> {
        let body = self.source.fetch(&self.url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Poll `source` until the expected services show up in the first trace.
pub async fn wait_for_services(
    policy: &PollPolicy,
    source: &mut dyn TraceSource,
    url: Url,
    expected: &ExpectedServices,
) -> Result<PollSuccess<MatchedServices>, PollError<TraceQueryError>> {
    tracing::info!(
        url = %url,
        expected = ?expected.names(),
        max_wait_secs = policy.max_wait.as_secs(),
        "Waiting for traces"
    );
    let mut fetch = TraceFetch::new(source, url);
    poll_until(policy, &mut fetch, |response| expected.evaluate(response)).await
}

/// Strip the HTML a browser wraps around a raw JSON response.
///
/// Chrome and Firefox render `application/json` as `<pre>{...}</pre>` inside
/// a generated page; the page source is that HTML, with entities escaped.
pub fn extract_json(page_source: &str) -> String {
    let trimmed = page_source.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    let Some(open) = trimmed.find("<pre") else {
        return trimmed.to_string();
    };
    let Some(body_start) = trimmed[open..].find('>').map(|i| open + i + 1) else {
        return trimmed.to_string();
    };
    let body_end = trimmed[body_start..]
        .find("</pre>")
        .map(|i| body_start + i)
        .unwrap_or(trimmed.len());

    unescape_html(&trimmed[body_start..body_end])
}

fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
