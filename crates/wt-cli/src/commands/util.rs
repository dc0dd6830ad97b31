//! Shared helpers for subcommands.

use std::io::Write;

use anyhow::{Context, Result};

use wt_core::{ActivityId, ActivitySnapshot, UserId};

/// Validates the raw activity and user arguments.
pub fn parse_ids(activity: &str, user: &str) -> Result<(ActivityId, UserId)> {
    let activity = ActivityId::new(activity).context("invalid activity ID")?;
    let user = UserId::new(user).context("invalid user")?;
    Ok((activity, user))
}

/// Validates the raw user argument.
pub fn parse_user(user: &str) -> Result<UserId> {
    UserId::new(user).context("invalid user")
}

/// One-line summary of an activity after a transition.
pub fn write_summary<W: Write>(writer: &mut W, snapshot: &ActivitySnapshot) -> Result<()> {
    writeln!(
        writer,
        "{} is {} ({:.1} min total)",
        snapshot.id, snapshot.status, snapshot.total_duration_minutes
    )?;
    Ok(())
}
