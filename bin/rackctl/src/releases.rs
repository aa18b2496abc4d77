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
use rack_core::release_history;

use crate::context::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog().await?;
    let api = ctx.api()?;
    let history = release_history(api.as_ref(), &catalog).await?;

    let now = Utc::now();
    let width = history
        .rows
        .iter()
        .map(|row| row.id.len())
        .max()
        .unwrap_or(0)
        .max("VERSION".len());
    println!("{:<width$}  {:<16}  STATUS", "VERSION", "UPDATED");
    for row in &history.rows {
        let updated = row
            .created
            .map(|created| humanize(created, now))
            .unwrap_or_default();
        let status = row.marker.map(|marker| marker.as_str()).unwrap_or("");
        println!("{:<width$}  {updated:<16}  {status}", row.id);
    }
    if let Some(next) = history.newer_available {
        println!();
        println!("New version available: {next}");
    }
    Ok(())
}

pub(crate) fn humanize(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let (value, unit) = if elapsed.num_days() > 0 {
        (elapsed.num_days(), "day")
    } else if elapsed.num_hours() > 0 {
        (elapsed.num_hours(), "hour")
    } else if elapsed.num_minutes() > 0 {
        (elapsed.num_minutes(), "minute")
    } else {
        return "just now".to_owned();
    };
    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}
