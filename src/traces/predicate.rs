//! Expected-service predicate over a trace query document.
//!
//! The document satisfies the predicate when its first trace has a process
//! for every expected name. Each name is checked on its own: one service
//! name does not need to match two expected names.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ExpectedServicesConfig;
use crate::resilience::Attempt;
use crate::traces::types::TraceQueryResponse;

/// Fixed set of services a run expects to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedServices {
    required_fragment: String,
    names: Vec<String>,
}

/// Service names found for each expected name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedServices {
    /// Expected name → first service name matching it.
    pub matches: BTreeMap<String, String>,
    /// Every service name in the evaluated trace.
    pub service_names: BTreeSet<String>,
}

impl ExpectedServices {
    pub fn new(required_fragment: impl Into<String>, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required_fragment: required_fragment.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ExpectedServicesConfig) -> Self {
        Self::new(config.required_fragment.clone(), config.names.iter().cloned())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `service` counts for `name` when it contains both the fragment and the name.
    pub fn matches(&self, service: &str, name: &str) -> bool {
        service.contains(&self.required_fragment) && service.contains(name)
    }

    /// Evaluate the predicate against one fetched document.
    pub fn evaluate(&self, response: &TraceQueryResponse) -> Attempt<MatchedServices> {
        let service_names = match service_names(response) {
            Ok(names) => names,
            Err(diagnostic) => return Attempt::Unsatisfied(diagnostic),
        };

        let mut matches = BTreeMap::new();
        let mut missing = Vec::new();
        for name in &self.names {
            match service_names.iter().find(|s| self.matches(s, name)) {
                Some(service) => {
                    matches.insert(name.clone(), service.clone());
                }
                None => missing.push(name.as_str()),
            }
        }

        if missing.is_empty() {
            Attempt::Satisfied(MatchedServices { matches, service_names })
        } else {
            let missing = missing
                .iter()
                .map(|name| format!("\"{}\" and \"{}\"", self.required_fragment, name))
                .collect::<Vec<_>>()
                .join(", ");
            let found = service_names.iter().collect::<Vec<_>>();
            Attempt::Unsatisfied(format!(
                "no service name containing {}; found: {:?}",
                missing, found
            ))
        }
    }
}

impl Default for ExpectedServices {
    fn default() -> Self {
        Self::from_config(&ExpectedServicesConfig::default())
    }
}

/// Service names of the first trace's processes, or why there are none.
pub fn service_names(response: &TraceQueryResponse) -> Result<BTreeSet<String>, String> {
    let traces = response
        .data
        .as_ref()
        .ok_or_else(|| "trace document has no \"data\" field".to_string())?;
    let first = traces
        .first()
        .ok_or_else(|| "trace document \"data\" is empty".to_string())?;
    let processes = first
        .processes
        .as_ref()
        .ok_or_else(|| "first trace has no \"processes\"".to_string())?;

    Ok(processes
        .values()
        .filter_map(|p| p.service_name.clone())
        .collect())
}
