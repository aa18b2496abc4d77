//! ---
//! rack_section: "05-cli"
//! rack_subsection: "binary"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Operator CLI for rack updates, parameters, scaling, and local racks."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use rack_core::{DockerCli, LocalRackManager, LocalRackSpec};

use crate::context::Context;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Container name; defaults to `[local].name`.
    #[arg(long)]
    pub name: Option<String>,
    /// Router network address handed to the rack.
    #[arg(long)]
    pub router: Option<String>,
    /// Rack version to run; defaults to the latest release.
    #[arg(long)]
    pub version: Option<String>,
}

pub async fn run(ctx: &Context, args: StartArgs) -> Result<()> {
    let local = &ctx.config.local;
    let version = match args.version {
        Some(version) => version,
        None => ctx.catalog().await?.latest()?.id.clone(),
    };
    let mut spec = LocalRackSpec::from_config(local, version);
    if let Some(name) = args.name {
        spec = spec.with_name(name);
    }
    if let Some(router) = args.router {
        spec = spec.with_router(router);
    }

    let manager = LocalRackManager::new(Arc::new(DockerCli::new(&local.docker_binary)));
    let exit = manager.start(&spec).await?;
    if !exit.success() {
        match exit.code {
            Some(code) => bail!("local rack {} exited with status {code}", exit.name),
            None => bail!("local rack {} was terminated", exit.name),
        }
    }
    Ok(())
}
