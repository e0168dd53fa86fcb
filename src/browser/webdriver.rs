//! W3C WebDriver backend.
//!
//! # Responsibilities
//! - Open a session on a WebDriver endpoint (chromedriver, geckodriver, selenium)
//! - Translate `Browser` calls into WebDriver commands
//! - Map `no such element` to `Lookup::NotFound`
//!
//! # Design Decisions
//! - Plain JSON over reqwest; no driver-specific client
//! - Every command is bounded by the configured command timeout
//! - Form submission runs a small script, since W3C WebDriver has no submit command

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::browser::{Browser, BrowserError, ElementRef, Lookup, Selector};
use crate::config::BrowserConfig;

/// Key under which WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const SUBMIT_SCRIPT: &str = "var el = arguments[0]; \
    var form = el.form || el.closest('form'); \
    if (!form) { el.click(); return; } \
    if (typeof form.requestSubmit !== 'function') { form.submit(); return; } \
    if (el.type === 'submit') { form.requestSubmit(el); } else { form.requestSubmit(); }";

/// A live WebDriver session.
pub struct WebDriverBrowser {
    client: Client,
    endpoint: String,
    session_id: Option<String>,
}

impl WebDriverBrowser {
    /// Open a new session on the configured endpoint.
    pub async fn connect(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.command_timeout_secs))
            .build()?;

        let mut browser = Self {
            client,
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            session_id: None,
        };

        let body = json!({ "capabilities": { "alwaysMatch": capabilities(config) } });
        let url = format!("{}/session", browser.endpoint);
        let value = browser.command(Method::POST, &url, Some(body)).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::UnexpectedResponse(format!("no sessionId in {}", value)))?
            .to_string();

        tracing::info!(
            endpoint = %browser.endpoint,
            session_id = %session_id,
            browser = %config.browser_name,
            "WebDriver session opened"
        );
        browser.session_id = Some(session_id);
        Ok(browser)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn session_url(&self, path: &str) -> Result<String, BrowserError> {
        let id = self.session_id.as_deref().ok_or(BrowserError::Closed)?;
        Ok(format!("{}/session/{}{}", self.endpoint, id, path))
    }

    /// Send one command and unwrap the `value` member of the reply.
    async fn command(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, BrowserError> {
        tracing::trace!(method = %method, url = %url, "WebDriver command");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let mut payload: Value = response.json().await?;
        let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(BrowserError::Protocol {
                error: error.to_string(),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        if !status.is_success() {
            return Err(BrowserError::UnexpectedResponse(format!("status {}: {}", status, value)));
        }

        Ok(value)
    }
}

fn capabilities(config: &BrowserConfig) -> Value {
    let mut caps = json!({ "browserName": config.browser_name });
    if config.headless {
        match config.browser_name.as_str() {
            "firefox" => caps["moz:firefoxOptions"] = json!({ "args": ["-headless"] }),
            _ => caps["goog:chromeOptions"] = json!({ "args": ["--headless=new", "--no-sandbox"] }),
        }
    }
    caps
}

fn element_arg(element: &ElementRef) -> Value {
    let mut arg = serde_json::Map::new();
    arg.insert(ELEMENT_KEY.to_string(), Value::String(element.0.clone()));
    Value::Object(arg)
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let endpoint = self.session_url("/url")?;
        self.command(Method::POST, &endpoint, Some(json!({ "url": url }))).await?;
        tracing::debug!(url = %url, "Navigated");
        Ok(())
    }

    async fn find_element(&mut self, selector: &Selector) -> Result<Lookup<ElementRef>, BrowserError> {
        let endpoint = self.session_url("/element")?;
        let body = json!({ "using": "css selector", "value": selector.to_css() });

        match self.command(Method::POST, &endpoint, Some(body)).await {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Lookup::Found(ElementRef(id.to_string())))
                .ok_or_else(|| BrowserError::UnexpectedResponse(format!("no element reference in {}", value))),
            Err(BrowserError::Protocol { error, .. }) if error == "no such element" => {
                tracing::debug!(selector = %selector, "Element not found");
                Ok(Lookup::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn submit(&mut self, element: &ElementRef) -> Result<(), BrowserError> {
        let endpoint = self.session_url("/execute/sync")?;
        let body = json!({ "script": SUBMIT_SCRIPT, "args": [element_arg(element)] });
        self.command(Method::POST, &endpoint, Some(body)).await?;
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        let endpoint = self.session_url(&format!("/element/{}/value", element.0))?;
        self.command(Method::POST, &endpoint, Some(json!({ "text": text }))).await?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        let endpoint = self.session_url("/source")?;
        match self.command(Method::GET, &endpoint, None).await? {
            Value::String(source) => Ok(source),
            other => Err(BrowserError::UnexpectedResponse(format!("page source is not a string: {}", other))),
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let endpoint = self.session_url("")?;
        let result = self.command(Method::DELETE, &endpoint, None).await;
        if let Some(id) = self.session_id.take() {
            tracing::info!(session_id = %id, "WebDriver session closed");
        }
        result.map(|_| ())
    }
}

impl Drop for WebDriverBrowser {
    fn drop(&mut self) {
        if let Some(id) = &self.session_id {
            tracing::warn!(session_id = %id, "WebDriver session dropped without close");
        }
    }
}
