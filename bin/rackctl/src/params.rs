//! ---
//! rack_section: "05-cli"
//! rack_subsection: "binary"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Operator CLI for rack updates, parameters, scaling, and local racks."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Args, Subcommand};
use rack_core::{ParameterConvergence, ParameterSet, RackApi, RackError};
use rack_logging::{log_system_event, LogContext, SystemEventOutcome};
use tracing::info;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct ParamsArgs {
    #[command(subcommand)]
    pub command: Option<ParamsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ParamsCommand {
    /// Overwrite the named parameters.
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[arg(required = true, value_name = "NAME=VALUE")]
    pub assignments: Vec<String>,
    /// Block until the rack settles.
    #[arg(long, env = "RACK_WAIT")]
    pub wait: bool,
}

pub async fn run(ctx: &Context, args: ParamsArgs) -> Result<()> {
    match args.command {
        None => list(ctx).await,
        Some(ParamsCommand::Set(set_args)) => set(ctx, set_args).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    let system = api.get_system().await?;
    let params = ParameterConvergence::new(api).list(&system.name).await?;
    let width = params.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, value) in params {
        println!("{name:<width$}  {value}");
    }
    Ok(())
}

async fn set(ctx: &Context, args: SetArgs) -> Result<()> {
    let params = ParameterSet::parse_assignments(&args.assignments)?;
    let api = ctx.api()?;
    let system = api.get_system().await?;
    let convergence = ParameterConvergence::new(api.clone());

    for change in convergence.diff(&system.name, &params).await? {
        info!(
            name = %change.name,
            from = change.from.as_deref().unwrap_or(""),
            to = %change.to,
            "parameter change"
        );
    }

    let log_ctx = LogContext::new()
        .with_rack(&system.name)
        .with_operation("params");
    match convergence.apply(&system.name, &params).await {
        Ok(()) => println!("Updating parameters: OK"),
        Err(RackError::NoopUpdate) => {
            log_system_event(
                Some(&log_ctx),
                "params",
                "no updates are to be performed",
                SystemEventOutcome::Noop,
            );
            println!("No updates are to be performed");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    if args.wait {
        let version = ctx
            .supervisor(api)
            .wait_for_change(&system.version, &system.version)
            .await?
            .ensure_converged()?;
        log_system_event(Some(&log_ctx), "params", "converged", SystemEventOutcome::Success);
        println!("Rack is running {version}");
    }
    Ok(())
}
