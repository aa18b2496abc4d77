//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::sync::Arc;

use indexmap::IndexMap;
use rack_logging::{rack_info, LogContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::RackApi;
use crate::error::{is_noop_message, RackError, Result};

/// Parameter name to value mapping, in the order the caller supplied it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(IndexMap<String, String>);

impl ParameterSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `NAME=VALUE` arguments. Values may themselves contain `=`.
    pub fn parse_assignments<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((name, value)) = arg.split_once('=') else {
                return Err(RackError::InvalidArgument(arg.to_owned()));
            };
            if name.is_empty() {
                return Err(RackError::InvalidArgument(arg.to_owned()));
            }
            params.insert(name, value);
        }
        Ok(params)
    }

    /// Add or overwrite one entry.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Entries whose value differs from `current`, including names absent there.
    pub fn changed_from(&self, current: &IndexMap<String, String>) -> Vec<ParameterChange> {
        self.0
            .iter()
            .filter(|(name, value)| current.get(*name) != Some(*value))
            .map(|(name, value)| ParameterChange {
                name: name.clone(),
                from: current.get(name).cloned(),
                to: value.clone(),
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// A single parameter that an apply would change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterChange {
    /// Parameter name.
    pub name: String,
    /// Current remote value; `None` when the rack does not know the name yet.
    pub from: Option<String>,
    /// Value the apply would set.
    pub to: String,
}

/// Applies parameter sets to a rack and classifies the remote answer.
#[derive(Clone)]
pub struct ParameterConvergence {
    api: Arc<dyn RackApi>,
}

impl ParameterConvergence {
    /// Convergence against the given rack.
    pub fn new(api: Arc<dyn RackApi>) -> Self {
        Self { api }
    }

    /// Remote parameters sorted by name.
    pub async fn list(&self, system: &str) -> Result<Vec<(String, String)>> {
        let mut params: Vec<_> = self.api.list_parameters(system).await?.into_iter().collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(params)
    }

    /// Parameters in `desired` that differ from the rack's current values.
    pub async fn diff(&self, system: &str, desired: &ParameterSet) -> Result<Vec<ParameterChange>> {
        let current = self.api.list_parameters(system).await?;
        Ok(desired.changed_from(&current))
    }

    /// Send the full set for a targeted update.
    ///
    /// A remote "no updates are to be performed" failure is reported as
    /// [`RackError::NoopUpdate`] so callers can treat it as success.
    pub async fn apply(&self, system: &str, params: &ParameterSet) -> Result<()> {
        if params.is_empty() {
            return Err(RackError::InvalidArgument(
                "at least one NAME=VALUE is required".to_owned(),
            ));
        }
        let ctx = LogContext::new().with_rack(system).with_operation("params");
        rack_info!(context = ctx, "applying {} parameter(s)", params.len());
        match self.api.set_parameters(system, params).await {
            Ok(()) => Ok(()),
            Err(err) if is_noop_message(&err.to_string()) => {
                debug!(system, error = %err, "parameter update was a no-op");
                Err(RackError::NoopUpdate)
            }
            Err(err) => Err(err),
        }
    }
}
