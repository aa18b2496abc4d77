//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! Rollout supervision, parameter convergence, and local rack lifecycle.
#![warn(missing_docs)]

pub mod api;
pub mod client;
pub mod error;
pub mod local;
pub mod logs;
pub mod metrics;
pub mod params;
pub mod releases;
pub mod rollout;
pub mod scale;
pub mod system;

pub use api::RackApi;
pub use client::HttpRackClient;
pub use error::{RackError, Result};
pub use local::{
    ContainerExit, ContainerRuntime, DockerCli, LocalRackExit, LocalRackManager, LocalRackSpec,
};
pub use logs::LogOptions;
pub use metrics::RolloutMetric;
pub use params::{ParameterChange, ParameterConvergence, ParameterSet};
pub use releases::{release_history, ReleaseHistory, ReleaseMarker, ReleaseRow};
pub use rollout::{
    RolloutAck, RolloutOutcome, RolloutSupervisor, RolloutTracker, SupervisorSettings,
};
pub use scale::{scale, ScaleRequest};
pub use system::{SystemProcess, SystemRelease, SystemState, SystemStatus};
