//! ---
//! rack_section: "05-cli"
//! rack_subsection: "binary"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Operator CLI for rack updates, parameters, scaling, and local racks."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use rack_common::init_tracing;
use rack_versioning::VersionInfo;
use tokio::runtime::Runtime;

mod context;
mod info;
mod logs;
mod params;
mod ps;
mod releases;
mod scale;
mod start;
mod update;

use context::{Context, GlobalArgs};

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Rack control-plane client",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print extended version information and exit"
    )]
    version: bool,
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the rack's current state.
    Info,
    /// Update the rack, one required release at a time.
    Update(update::UpdateArgs),
    /// List or set rack parameters.
    Params(params::ParamsArgs),
    /// Change instance count or type.
    Scale(scale::ScaleArgs),
    /// Show the rack's version history.
    Releases,
    /// Stream the rack's own logs.
    Logs(logs::LogsArgs),
    /// List the rack's processes.
    Ps(ps::PsArgs),
    /// Run a local rack in the foreground.
    Start(start::StartArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", VersionInfo::current().extended());
        return Ok(());
    }
    let Some(command) = cli.command else {
        bail!("no command given; run `rackctl --help` for usage");
    };

    let ctx = Context::load(cli.global)?;
    init_tracing("rackctl", &ctx.config.logging)?;
    if let Some(source) = &ctx.source {
        tracing::debug!(config = %source.display(), "configuration loaded");
    }

    let runtime = Runtime::new()?;
    let result = runtime.block_on(async {
        match command {
            Commands::Info => info::run(&ctx).await,
            Commands::Update(args) => update::run(&ctx, args).await,
            Commands::Params(args) => params::run(&ctx, args).await,
            Commands::Scale(args) => scale::run(&ctx, args).await,
            Commands::Releases => releases::run(&ctx).await,
            Commands::Logs(args) => logs::run(&ctx, args).await,
            Commands::Ps(args) => ps::run(&ctx, args).await,
            Commands::Start(args) => start::run(&ctx, args).await,
        }
    });
    tracing::debug!(metrics = %rack_core::metrics::render(), "final metrics");
    result
}
