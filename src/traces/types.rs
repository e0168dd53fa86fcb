//! Trace query document types and error definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::browser::BrowserError;

/// Response of `GET /api/traces`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TraceQueryResponse {
    /// Matching traces, most recent first. Absent or null when the query failed.
    #[serde(default)]
    pub data: Option<Vec<TraceRecord>>,
}

/// One trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TraceRecord {
    #[serde(rename = "traceID", default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Processes keyed by opaque process ID (`p1`, `p2`, ...).
    #[serde(default)]
    pub processes: Option<BTreeMap<String, Process>>,
}

/// A traced service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Process {
    #[serde(rename = "serviceName", default)]
    pub service_name: Option<String>,
}

/// Errors that can occur while fetching a trace document.
#[derive(Debug, Error)]
pub enum TraceQueryError {
    /// Base URL cannot carry a path.
    #[error("invalid trace query URL '{0}'")]
    InvalidUrl(String),

    /// HTTP request failed.
    #[error("trace query request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Trace query answered with a non-success status.
    #[error("trace query returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Browser failed to load or read the page.
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// Body is not a trace query document.
    #[error("malformed trace document: {0}")]
    Malformed(#[from] serde_json::Error),
}
