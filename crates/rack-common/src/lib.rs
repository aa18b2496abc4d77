//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Shared primitives for the rack control-plane client."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! Shared primitives for the rackctl workspace.
//! This crate exposes configuration loading, the explicit credentials value
//! handed to the remote accessor, and tracing initialisation.

pub mod config;
pub mod credentials;
pub mod logging;

pub use config::{
    LocalConfig, LoggingConfig, RackConfig, RegistryConfig, RemoteConfig, RolloutConfig,
};
pub use credentials::RackCredentials;
pub use logging::{init_tracing, LogFormat};
