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
use clap::Args;
use rack_core::{RackApi, RolloutOutcome};
use rack_logging::{log_system_event, LogContext, SystemEventOutcome};

use crate::context::Context;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Target version; defaults to the latest release.
    pub version: Option<String>,
    /// Block until the rack settles.
    #[arg(long, env = "RACK_WAIT")]
    pub wait: bool,
}

pub async fn run(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let catalog = ctx.catalog().await?;
    let api = ctx.api()?;
    let system = api.get_system().await?;
    let plan = catalog.plan_update(&system.version, args.version.as_deref())?;
    if plan.gated {
        println!(
            "WARNING: Required update found. Run `rackctl update` again once this update completes."
        );
    }

    let target = plan.target.id.clone();
    let supervisor = ctx.supervisor(api);
    supervisor.trigger(&target).await?;
    println!("Updating to {target}: UPDATING");

    if !args.wait {
        return Ok(());
    }
    let log_ctx = LogContext::new()
        .with_rack(&system.name)
        .with_version(&target)
        .with_operation("update");
    match supervisor.wait_for_change(&system.version, &target).await {
        Ok(RolloutOutcome::Converged { version }) => {
            log_system_event(Some(&log_ctx), "rollout", "converged", SystemEventOutcome::Success);
            println!("Rack is running {version}");
            Ok(())
        }
        Ok(outcome) => {
            log_system_event(Some(&log_ctx), "rollout", "rolled back", SystemEventOutcome::Fault);
            outcome.ensure_converged()?;
            Ok(())
        }
        Err(err) => {
            log_system_event(Some(&log_ctx), "rollout", &err.to_string(), SystemEventOutcome::Fault);
            Err(err.into())
        }
    }
}
