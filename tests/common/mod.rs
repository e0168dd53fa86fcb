//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use trace_verifier::browser::webdriver::ELEMENT_KEY;
use trace_verifier::browser::{Browser, BrowserError, ElementRef, Lookup, Selector};
use trace_verifier::config::VerifierConfig;

pub const BOTH_SERVICES: &str = r#"{"data": [{"traceID": "t1", "processes": {
    "p1": {"serviceName": "istio-ingressgateway"},
    "p2": {"serviceName": "thorntail-greeting"},
    "p3": {"serviceName": "thorntail-cute-name"}
}}]}"#;

pub const GREETING_ONLY: &str =
    r#"{"data": [{"processes": {"p1": {"serviceName": "thorntail-greeting"}}}]}"#;

pub const EMPTY: &str = r#"{"data": []}"#;

/// Serve `router` on an ephemeral local port.
pub async fn start_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Gateway answering `GET /api/greeting` with a fixed status and body.
pub async fn start_gateway(status: u16, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let router = Router::new().route(
        "/api/greeting",
        get(move || {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                (StatusCode::from_u16(status).unwrap(), body)
            }
        }),
    );
    (start_server(router).await, hits)
}

/// Recorded trace queries plus the documents to serve, in order.
#[derive(Clone, Default)]
pub struct TraceApi {
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    responses: Arc<Mutex<VecDeque<&'static str>>>,
}

impl TraceApi {
    pub fn hits(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

/// Trace query API serving `responses` in order; the last one repeats.
pub async fn start_trace_api(responses: Vec<&'static str>) -> (SocketAddr, TraceApi) {
    let api = TraceApi {
        queries: Arc::default(),
        responses: Arc::new(Mutex::new(responses.into())),
    };
    let router = Router::new()
        .route("/api/traces", get(serve_traces))
        .with_state(api.clone());
    (start_server(router).await, api)
}

async fn serve_traces(
    State(api): State<TraceApi>,
    Query(params): Query<HashMap<String, String>>,
) -> &'static str {
    api.queries.lock().unwrap().push(params);
    let mut responses = api.responses.lock().unwrap();
    if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().copied().unwrap_or("{}")
    }
}

/// Minimal W3C WebDriver endpoint.
#[derive(Clone)]
pub struct WebDriverMock {
    pub commands: Arc<Mutex<Vec<String>>>,
    present: Arc<HashSet<String>>,
    source: Arc<String>,
}

impl WebDriverMock {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

/// WebDriver endpoint where the CSS selectors in `present` exist and every page has `source`.
pub async fn start_webdriver(present: &[&str], source: &str) -> (SocketAddr, WebDriverMock) {
    let mock = WebDriverMock {
        commands: Arc::default(),
        present: Arc::new(present.iter().map(|s| s.to_string()).collect()),
        source: Arc::new(source.to_string()),
    };
    let router = Router::new()
        .route("/session", post(new_session))
        .route("/session/{id}", delete(delete_session))
        .route("/session/{id}/url", post(navigate))
        .route("/session/{id}/element", post(find_element))
        .route("/session/{id}/element/{element}/value", post(send_keys))
        .route("/session/{id}/execute/sync", post(execute))
        .route("/session/{id}/source", get(page_source))
        .with_state(mock.clone());
    (start_server(router).await, mock)
}

async fn new_session(State(mock): State<WebDriverMock>, Json(body): Json<Value>) -> Json<Value> {
    mock.record(format!("new_session {}", body["capabilities"]["alwaysMatch"]["browserName"]));
    Json(json!({ "value": { "sessionId": "s1", "capabilities": {} } }))
}

async fn delete_session(State(mock): State<WebDriverMock>, Path(id): Path<String>) -> Json<Value> {
    mock.record(format!("delete {}", id));
    Json(json!({ "value": null }))
}

async fn navigate(
    State(mock): State<WebDriverMock>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.record(format!("url {}", body["url"].as_str().unwrap_or_default()));
    Json(json!({ "value": null }))
}

async fn find_element(
    State(mock): State<WebDriverMock>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let css = body["value"].as_str().unwrap_or_default().to_string();
    mock.record(format!("find {}", css));
    if mock.present.contains(&css) {
        let mut element = serde_json::Map::new();
        element.insert(ELEMENT_KEY.to_string(), Value::String(css));
        (StatusCode::OK, Json(json!({ "value": element })))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "value": {
                "error": "no such element",
                "message": format!("Unable to locate element: {}", css),
                "stacktrace": ""
            } })),
        )
    }
}

async fn send_keys(
    State(mock): State<WebDriverMock>,
    Path((_id, element)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.record(format!("keys {} {}", element, body["text"].as_str().unwrap_or_default()));
    Json(json!({ "value": null }))
}

async fn execute(
    State(mock): State<WebDriverMock>,
    Path(_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let element = body["args"][0][ELEMENT_KEY].as_str().unwrap_or_default().to_string();
    mock.record(format!("submit {}", element));
    Json(json!({ "value": null }))
}

async fn page_source(State(mock): State<WebDriverMock>, Path(_id): Path<String>) -> Json<Value> {
    mock.record("source".to_string());
    Json(json!({ "value": mock.source.as_str() }))
}

/// In-memory browser: fixed set of present elements, scripted page sources.
#[derive(Default)]
pub struct FakeBrowser {
    pub present: HashSet<Selector>,
    pub pages: VecDeque<String>,
    pub actions: Vec<String>,
    pub closed: bool,
}

impl FakeBrowser {
    /// Login page with the form fields and, optionally, the consent button.
    pub fn login_page(with_consent: bool) -> Self {
        let mut present: HashSet<Selector> = [
            Selector::class_name("btn-primary"),
            Selector::id("inputUsername"),
            Selector::id("inputPassword"),
        ]
        .into_iter()
        .collect();
        if with_consent {
            present.insert(Selector::name("approve"));
        }
        Self {
            present,
            ..Self::default()
        }
    }

    /// Page sources returned by successive reads; the last one repeats.
    pub fn with_pages(mut self, pages: &[&str]) -> Self {
        self.pages = pages.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.actions.iter().filter(|a| a.starts_with(prefix)).count()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.actions.push(format!("navigate {}", url));
        Ok(())
    }

    async fn find_element(&mut self, selector: &Selector) -> Result<Lookup<ElementRef>, BrowserError> {
        self.actions.push(format!("find {}", selector));
        if self.present.contains(selector) {
            Ok(Lookup::Found(ElementRef(selector.to_string())))
        } else {
            Ok(Lookup::NotFound)
        }
    }

    async fn submit(&mut self, element: &ElementRef) -> Result<(), BrowserError> {
        self.actions.push(format!("submit {}", element.0));
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        self.actions.push(format!("keys {} {}", element.0, text));
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.actions.push("source".to_string());
        let page = if self.pages.len() > 1 {
            self.pages.pop_front().unwrap_or_default()
        } else {
            self.pages.front().cloned().unwrap_or_default()
        };
        Ok(page)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.actions.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}

/// Config pointing at local mocks, with a short poll budget.
pub fn test_config(gateway: SocketAddr, max_wait_secs: u64) -> VerifierConfig {
    let mut config = VerifierConfig::default();
    config.gateway.base_url = format!("http://{}", gateway);
    config.jaeger.base_url = "http://jaeger.test".to_string();
    config.poll.max_wait_secs = max_wait_secs;
    config.poll.initial_interval_ms = 50;
    config.poll.max_interval_ms = 200;
    config
}
