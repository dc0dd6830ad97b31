//! Show command for one activity with its session history.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

use wt_db::Database;

use super::util::parse_ids;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    activity: &str,
    user: &str,
    json: bool,
) -> Result<()> {
    let (activity, user) = parse_ids(activity, user)?;
    let snapshot = db.get_activity(&activity, &user)?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &snapshot)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "Activity {}", snapshot.id)?;
    writeln!(writer, "Status: {}", snapshot.status)?;
    if let Some(description) = &snapshot.description {
        writeln!(writer, "Description: {description}")?;
    }
    if let Some(category) = &snapshot.category_id {
        writeln!(writer, "Category: {category}")?;
    }
    writeln!(writer, "Count: {}", snapshot.count)?;
    if let Some(completed_at) = snapshot.completed_at {
        writeln!(writer, "Completed: {}", render_timestamp(completed_at))?;
    }
    writeln!(writer, "Total: {:.1} min", snapshot.total_duration_minutes)?;

    if snapshot.sessions.is_empty() {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    }
    writeln!(writer, "Sessions:")?;
    for session in &snapshot.sessions {
        let end = session
            .ended_at
            .map_or_else(|| "(open)".to_string(), render_timestamp);
        writeln!(
            writer,
            "- {} -> {} ({:.1} min)",
            render_timestamp(session.started_at),
            end,
            session.duration_minutes
        )?;
    }
    Ok(())
}

fn render_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::{ActivityStatus, UserId};
    use wt_db::NewActivity;

    #[test]
    fn show_renders_sessions() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open(&temp.path().join("wt.db")).unwrap();
        let created = db
            .create_activity(&NewActivity {
                user_id: UserId::new("sami").unwrap(),
                category_id: Some("research".to_string()),
                description: Some("read papers".to_string()),
                initial_status: ActivityStatus::Started,
            })
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &created.id, "sami", false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Status: started"));
        assert!(output.contains("Description: read papers"));
        assert!(output.contains("Category: research"));
        assert!(output.contains("(open)"));
    }

    #[test]
    fn show_json_includes_sessions_and_total() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open(&temp.path().join("wt.db")).unwrap();
        let created = db
            .create_activity(&NewActivity {
                user_id: UserId::new("sami").unwrap(),
                category_id: None,
                description: None,
                initial_status: ActivityStatus::Paused,
            })
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &created.id, "sami", true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["status"], "paused");
        assert!(value["sessions"].as_array().unwrap().is_empty());
        assert!((value["total_duration_minutes"].as_f64().unwrap()).abs() < f64::EPSILON);
    }
}
