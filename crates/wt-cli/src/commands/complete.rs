//! Complete command: finish an activity.

use std::io::Write;

use anyhow::Result;

use wt_db::Database;

use super::util::{parse_ids, write_summary};

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    activity: &str,
    user: &str,
    count: Option<i64>,
    notes: Option<&str>,
) -> Result<()> {
    let (activity, user) = parse_ids(activity, user)?;
    let snapshot = db.complete_activity(&activity, &user, count, notes)?;
    write_summary(writer, &snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::ActivityStatus;
    use wt_db::NewActivity;

    #[test]
    fn complete_reports_final_status_and_total() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open(&temp.path().join("wt.db")).unwrap();
        let created = db
            .create_activity(&NewActivity {
                user_id: wt_core::UserId::new("sami").unwrap(),
                category_id: None,
                description: None,
                initial_status: ActivityStatus::Started,
            })
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut db, &created.id, "sami", Some(2), None).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("is completed"), "unexpected output: {output}");
        assert!(output.contains("min total"), "unexpected output: {output}");
    }
}
