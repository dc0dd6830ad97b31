//! Delete command: remove an activity and its sessions.

use std::io::Write;

use anyhow::Result;

use wt_db::Database;

use super::util::parse_ids;

pub fn run<W: Write>(writer: &mut W, db: &mut Database, activity: &str, user: &str) -> Result<()> {
    let (activity, user) = parse_ids(activity, user)?;
    db.delete_activity(&activity, &user)?;
    writeln!(writer, "Deleted {activity}")?;
    Ok(())
}
