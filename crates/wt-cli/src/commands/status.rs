//! Status command for showing the currently running activity.

use std::io::Write;

use anyhow::Result;

use wt_db::Database;

use super::util::parse_user;

pub fn run<W: Write>(writer: &mut W, db: &Database, user: &str) -> Result<()> {
    let user = parse_user(user)?;
    match db.running_activity(&user)? {
        Some(snapshot) => {
            writeln!(
                writer,
                "Running: {} ({:.1} min total){}",
                snapshot.id,
                snapshot.total_duration_minutes,
                snapshot
                    .description
                    .as_deref()
                    .map(|d| format!(" - {d}"))
                    .unwrap_or_default(),
            )?;
        }
        None => {
            writeln!(writer, "No running activity.")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::{ActivityStatus, UserId};
    use wt_db::NewActivity;

    #[test]
    fn status_reports_running_activity() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open(&temp.path().join("wt.db")).unwrap();
        let created = db
            .create_activity(&NewActivity {
                user_id: UserId::new("sami").unwrap(),
                category_id: None,
                description: Some("deep work".to_string()),
                initial_status: ActivityStatus::Started,
            })
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, "sami").unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains(&created.id));
        assert!(output.contains("deep work"));
    }

    #[test]
    fn status_reports_nothing_running() {
        let temp = tempfile::tempdir().unwrap();
        let db = Database::open(&temp.path().join("wt.db")).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, "sami").unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "No running activity.\n");
    }
}
