//! List command for a user's activities.

use std::io::Write;

use anyhow::Result;

use wt_core::ActivityStatus;
use wt_db::Database;

use super::util::parse_user;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    user: &str,
    status: Option<ActivityStatus>,
    json: bool,
) -> Result<()> {
    let user = parse_user(user)?;
    let snapshots = db.list_activities(&user, status)?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &snapshots)?;
        writeln!(writer)?;
        return Ok(());
    }

    if snapshots.is_empty() {
        writeln!(writer, "No activities.")?;
        return Ok(());
    }
    for snapshot in snapshots {
        writeln!(
            writer,
            "{}  {:<9}  {:>8.1} min  {}",
            snapshot.id,
            snapshot.status,
            snapshot.total_duration_minutes,
            snapshot.description.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}
