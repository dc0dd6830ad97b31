//! Pause command: stop a running activity's timer.

use std::io::Write;

use anyhow::Result;

use wt_db::Database;

use super::util::{parse_ids, write_summary};

pub fn run<W: Write>(writer: &mut W, db: &mut Database, activity: &str, user: &str) -> Result<()> {
    let (activity, user) = parse_ids(activity, user)?;
    let snapshot = db.pause_activity(&activity, &user)?;
    write_summary(writer, &snapshot)
}
