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
use rack_core::ScaleRequest;

use crate::context::Context;
use crate::info::print_state;

#[derive(Debug, Args)]
pub struct ScaleArgs {
    /// Number of instances.
    #[arg(long)]
    pub count: Option<u32>,
    /// Instance type.
    #[arg(long = "type", value_name = "TYPE")]
    pub instance_type: Option<String>,
}

pub async fn run(ctx: &Context, args: ScaleArgs) -> Result<()> {
    let request = ScaleRequest::new(args.count, args.instance_type);
    let api = ctx.api()?;
    let state = rack_core::scale(api.as_ref(), &request).await?;
    print_state(&state);
    Ok(())
}
