//! New command for creating an activity.

use std::io::Write;

use anyhow::Result;

use wt_core::ActivityStatus;
use wt_db::{Database, NewActivity};

use super::util::parse_user;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &str,
    description: Option<String>,
    category: Option<String>,
    start: bool,
) -> Result<()> {
    let initial_status = if start {
        ActivityStatus::Started
    } else {
        ActivityStatus::Paused
    };
    let snapshot = db.create_activity(&NewActivity {
        user_id: parse_user(user)?,
        category_id: category,
        description,
        initial_status,
    })?;

    writeln!(writer, "Created {} ({})", snapshot.id, snapshot.status)?;
    Ok(())
}
