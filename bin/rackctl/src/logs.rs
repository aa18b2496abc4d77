//! ---
//! rack_section: "05-cli"
//! rack_subsection: "binary"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Operator CLI for rack updates, parameters, scaling, and local racks."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use rack_core::{LogOptions, RackApi};
use tracing::debug;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Only show lines matching this pattern.
    #[arg(long)]
    pub filter: Option<String>,
    /// Exit once the backlog is printed.
    #[arg(long = "no-follow", action = clap::ArgAction::SetFalse)]
    pub follow: bool,
    /// How far back to start, e.g. `2m` or `1h`.
    #[arg(long, default_value = "2m", value_parser = humantime::parse_duration)]
    pub since: Duration,
}

impl LogsArgs {
    fn options(self) -> LogOptions {
        LogOptions {
            filter: self.filter,
            follow: self.follow,
            since: self.since,
        }
    }
}

pub async fn run(ctx: &Context, args: LogsArgs) -> Result<()> {
    let api = ctx.api()?;
    let mut stdout = tokio::io::stdout();
    let written = api.stream_logs(&args.options(), &mut stdout).await?;
    debug!(bytes = written, "log stream ended");
    Ok(())
}
