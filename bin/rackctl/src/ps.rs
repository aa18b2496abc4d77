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
use chrono::{DateTime, Utc};
use clap::Args;
use rack_core::{RackApi, SystemProcess};

use crate::context::Context;
use crate::releases::humanize;

const HEADERS: [&str; 6] = ["ID", "APP", "NAME", "RELEASE", "STARTED", "COMMAND"];

#[derive(Debug, Args)]
pub struct PsArgs {
    /// Include app processes, not just the rack's own.
    #[arg(short, long)]
    pub all: bool,
}

pub async fn run(ctx: &Context, args: PsArgs) -> Result<()> {
    let api = ctx.api()?;
    let processes = api.list_processes(args.all).await?;
    for line in render(&processes, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}

fn render(processes: &[SystemProcess], now: DateTime<Utc>) -> Vec<String> {
    let rows: Vec<[String; 6]> = processes
        .iter()
        .map(|ps| {
            [
                ps.id.clone(),
                ps.app.clone(),
                ps.name.clone(),
                ps.release.clone(),
                ps.started
                    .map(|started| humanize(started, now))
                    .unwrap_or_default(),
                ps.command.clone(),
            ]
        })
        .collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    let line = |cells: [&str; 6]| {
        let mut out = String::new();
        for (idx, cell) in cells.iter().enumerate() {
            if idx == cells.len() - 1 {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{cell:<width$}  ", width = widths[idx]));
            }
        }
        out.trim_end().to_owned()
    };
    let mut lines = vec![line(HEADERS)];
    lines.extend(rows.iter().map(|row| line(row.each_ref().map(String::as_str))));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn process(id: &str, app: &str, started: Option<DateTime<Utc>>) -> SystemProcess {
        SystemProcess {
            id: id.into(),
            app: app.into(),
            name: "web".into(),
            release: "RABCDEF".into(),
            command: "api".into(),
            instance: String::new(),
            status: "running".into(),
            started,
            cpu: 0.0,
            memory: 0.0,
        }
    }

    #[test]
    fn columns_align_to_the_widest_cell() {
        let now = Utc::now();
        let lines = render(
            &[
                process("a1b2c3d4e5", "rack", Some(now - Duration::hours(2))),
                process("f6", "billing", None),
            ],
            now,
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID          APP      NAME"));
        assert!(lines[1].contains("2 hours ago"));
        assert!(lines[2].starts_with("f6          billing  web"));
        assert!(lines[2].ends_with("api"));
    }

    #[test]
    fn empty_listing_prints_only_headers() {
        let lines = render(&[], Utc::now());
        assert_eq!(lines, vec!["ID  APP  NAME  RELEASE  STARTED  COMMAND".to_owned()]);
    }
}
