//! Trace query URL construction.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use url::Url;

use crate::config::JaegerConfig;
use crate::traces::types::TraceQueryError;

/// A `GET /api/traces` query against the trace query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceQuery {
    base: Url,
    service: String,
    start_micros: Option<u64>,
}

impl TraceQuery {
    pub fn new(base_url: &str, service: impl Into<String>) -> Result<Self, TraceQueryError> {
        let base = Url::parse(base_url).map_err(|_| TraceQueryError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(TraceQueryError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base,
            service: service.into(),
            start_micros: None,
        })
    }

    /// Query for the configured service, starting `clock_skew_secs` before `now`
    /// when the start filter is enabled.
    pub fn from_config(config: &JaegerConfig, now: SystemTime) -> Result<Self, TraceQueryError> {
        let query = Self::new(&config.base_url, config.service.clone())?;
        Ok(if config.start_filter {
            query.with_start(start_micros(now, Duration::from_secs(config.clock_skew_secs)))
        } else {
            query
        })
    }

    /// Only return traces that started at or after `micros` since the epoch.
    pub fn with_start(mut self, micros: u64) -> Self {
        self.start_micros = Some(micros);
        self
    }

    pub fn start_micros(&self) -> Option<u64> {
        self.start_micros
    }

    /// Full query URL.
    pub fn url(&self) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "traces"]);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("service", &self.service);
            if let Some(start) = self.start_micros {
                pairs.append_pair("start", &start.to_string());
            }
        }
        url
    }
}

/// Microseconds since the epoch at `now - skew`, clamped at zero.
pub fn start_micros(now: SystemTime, skew: Duration) -> u64 {
    now.checked_sub(skew)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
