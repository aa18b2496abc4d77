//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::io::AsyncWrite;

use crate::error::Result;
use crate::logs::LogOptions;
use crate::params::ParameterSet;
use crate::scale::ScaleRequest;
use crate::system::{SystemProcess, SystemRelease, SystemState};

/// Access to one rack's management API.
#[async_trait]
pub trait RackApi: Send + Sync {
    /// Current state of the rack.
    async fn get_system(&self) -> Result<SystemState>;

    /// Begin a version transition. Fails when the rack reports nothing to do.
    async fn update_system(&self, version: &str) -> Result<SystemState>;

    /// Persisted parameters of the named system.
    async fn list_parameters(&self, system: &str) -> Result<IndexMap<String, String>>;

    /// Overwrite the given parameters; names not present stay unchanged remotely.
    async fn set_parameters(&self, system: &str, params: &ParameterSet) -> Result<()>;

    /// Change instance count and/or type.
    async fn scale_system(&self, request: &ScaleRequest) -> Result<SystemState>;

    /// Versions this rack has run, newest first.
    async fn list_releases(&self) -> Result<Vec<SystemRelease>>;

    /// Processes backing the rack itself; `all` includes app processes.
    async fn list_processes(&self, all: bool) -> Result<Vec<SystemProcess>>;

    /// Copy the rack's log stream into `sink` until it ends. Returns bytes written.
    async fn stream_logs(
        &self,
        options: &LogOptions,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}
