//! ---
//! rack_section: "05-cli"
//! rack_subsection: "binary"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Operator CLI for rack updates, parameters, scaling, and local racks."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::Args;
use rack_common::{RackConfig, RackCredentials};
use rack_core::{HttpRackClient, RolloutSupervisor, SupervisorSettings};
use rack_versioning::{
    FileVersionRegistry, HttpVersionRegistry, VersionCatalog, VersionInfo, VersionRegistry,
};

/// Connection options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (the RACK_CONFIG variable takes precedence).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Rack management host, e.g. `rack.example.org`.
    #[arg(long, global = true, env = "RACK_HOST")]
    pub host: Option<String>,
    /// Rack name sent with each request.
    #[arg(long, global = true, env = "RACK_NAME")]
    pub rack: Option<String>,
    /// Rack API password.
    #[arg(long, global = true, env = "RACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Resolved configuration plus command-line overrides.
pub struct Context {
    pub config: RackConfig,
    pub source: Option<PathBuf>,
    args: GlobalArgs,
}

impl Context {
    pub fn load(args: GlobalArgs) -> Result<Self> {
        let mut candidates = Vec::new();
        if let Some(path) = &args.config {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            candidates.push(path.clone());
        }
        candidates.extend(RackConfig::default_candidates());
        let loaded = RackConfig::load_with_source(&candidates)?;
        Ok(Self {
            config: loaded.config,
            source: loaded.source,
            args,
        })
    }

    pub fn credentials(&self) -> Result<RackCredentials> {
        let host = self
            .args
            .host
            .clone()
            .or_else(|| self.config.remote.host.clone())
            .ok_or_else(|| anyhow!("no rack host configured; pass --host or set [remote].host"))?;
        let mut credentials = RackCredentials::new(host);
        if let Some(password) = &self.args.password {
            credentials = credentials.with_password(password.clone());
        }
        if let Some(rack) = self.args.rack.clone().or_else(|| self.config.remote.rack.clone()) {
            credentials = credentials.with_rack(rack);
        }
        Ok(credentials)
    }

    pub fn api(&self) -> Result<Arc<HttpRackClient>> {
        let client = HttpRackClient::new(
            &self.credentials()?,
            self.config.remote.request_timeout,
            VersionInfo::current().semver,
        )?;
        Ok(Arc::new(client))
    }

    pub fn supervisor(&self, api: Arc<HttpRackClient>) -> RolloutSupervisor {
        RolloutSupervisor::new(api, SupervisorSettings::from(&self.config.rollout))
    }

    pub async fn catalog(&self) -> Result<VersionCatalog> {
        let registry: Box<dyn VersionRegistry> = match &self.config.registry.feed_path {
            Some(path) => Box::new(FileVersionRegistry::new(path)),
            None => Box::new(HttpVersionRegistry::new(&self.config.registry.url)?),
        };
        VersionCatalog::fetch(registry.as_ref())
            .await
            .context("unable to load the release catalog")
    }
}
