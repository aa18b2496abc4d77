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
use rack_core::{RackApi, SystemState};

use crate::context::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let state = ctx.api()?.get_system().await?;
    print_state(&state);
    Ok(())
}

pub fn print_state(state: &SystemState) {
    let rows = state.summary();
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        println!("{label:<width$}  {value}");
    }
}
