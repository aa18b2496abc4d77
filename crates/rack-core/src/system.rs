//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote rack status as reported by `GET /system`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SystemStatus {
    /// Stable and healthy.
    Running,
    /// A version or parameter transition is in progress.
    Updating,
    /// The rack is reverting a failed transition.
    Rollback,
    /// Any status this client does not model explicitly (`installing`, `converging`, ...).
    Other(String),
}

impl SystemStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            SystemStatus::Running => "running",
            SystemStatus::Updating => "updating",
            SystemStatus::Rollback => "rollback",
            SystemStatus::Other(other) => other,
        }
    }
}

impl From<String> for SystemStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "running" => SystemStatus::Running,
            "updating" => SystemStatus::Updating,
            "rollback" => SystemStatus::Rollback,
            _ => SystemStatus::Other(value),
        }
    }
}

impl From<&str> for SystemStatus {
    fn from(value: &str) -> Self {
        SystemStatus::from(value.to_owned())
    }
}

impl From<SystemStatus> for String {
    fn from(value: SystemStatus) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live snapshot of the remote rack. Never cached; every supervising step re-fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    /// Rack name, also the system name for parameter calls.
    pub name: String,
    /// Current status.
    pub status: SystemStatus,
    /// Release id the rack runs.
    pub version: String,
    /// Instance count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Instance type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Router domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cloud region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl SystemState {
    /// State with only the mandatory fields set.
    pub fn new(
        name: impl Into<String>,
        status: impl Into<SystemStatus>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            version: version.into(),
            count: None,
            instance_type: None,
            domain: None,
            region: None,
        }
    }

    /// Label/value pairs for display, skipping unset or empty optional fields.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Name", self.name.clone()),
            ("Status", self.status.to_string()),
            ("Version", self.version.clone()),
        ];
        if let Some(count) = self.count.filter(|count| *count > 0) {
            rows.push(("Count", count.to_string()));
        }
        let optional = [
            ("Domain", &self.domain),
            ("Region", &self.region),
            ("Type", &self.instance_type),
        ];
        for (label, value) in optional {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                rows.push((label, value.to_owned()));
            }
        }
        rows
    }
}

/// One entry of the rack's own release history (`GET /system/releases`), newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRelease {
    /// Release id.
    pub id: String,
    /// When the rack moved to this release.
    #[serde(default, alias = "created_at")]
    pub created: Option<DateTime<Utc>>,
}

/// One process on the rack (`GET /system/processes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemProcess {
    /// Process id.
    pub id: String,
    /// Owning app; the rack's own services report the rack name.
    #[serde(default)]
    pub app: String,
    /// Service name within the app.
    #[serde(default)]
    pub name: String,
    /// Release the process runs.
    #[serde(default)]
    pub release: String,
    /// Command line.
    #[serde(default)]
    pub command: String,
    /// Host instance id.
    #[serde(default)]
    pub instance: String,
    /// Scheduler status (`running`, `pending`, ...).
    #[serde(default)]
    pub status: String,
    /// Start time.
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    /// CPU share, percent.
    #[serde(default)]
    pub cpu: f64,
    /// Memory use, percent.
    #[serde(default)]
    pub memory: f64,
}
