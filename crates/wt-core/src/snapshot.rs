//! Serialized activity views returned to external callers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::{self, SessionInterval};
use crate::lifecycle::ActivityStatus;

/// One session as reported to callers, with its duration materialized.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub started_at: DateTime<Utc>,
    /// `None` while the session is open.
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: f64,
}

impl SessionView {
    /// Resolves an interval into a view as of `now`.
    #[must_use]
    pub fn from_interval(interval: &SessionInterval, now: DateTime<Utc>) -> Self {
        Self {
            started_at: interval.started_at,
            ended_at: interval.ended_at,
            duration_minutes: ledger::interval_minutes(interval, now),
        }
    }
}

/// Snapshot of an activity and its accumulated time.
///
/// This is the value every timer operation returns; the surrounding
/// application renders it, the core never formats user-facing pages.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySnapshot {
    pub id: String,
    pub user_id: String,
    pub status: ActivityStatus,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub count: i64,
    pub completed_at: Option<DateTime<Utc>>,
    /// Approval is orthogonal to the lifecycle; set by a separate actor.
    pub approved_at: Option<DateTime<Utc>>,
    pub sessions: Vec<SessionView>,
    pub total_duration_minutes: f64,
}

impl ActivitySnapshot {
    /// Resolves the session views and total for `intervals` as of `now`.
    ///
    /// The total is [`ledger::total_minutes`], the single source of truth
    /// for durations, so it always equals the sum of the returned views.
    #[must_use]
    pub fn resolve_sessions(
        intervals: &[SessionInterval],
        now: DateTime<Utc>,
    ) -> (Vec<SessionView>, f64) {
        let views = intervals
            .iter()
            .map(|interval| SessionView::from_interval(interval, now))
            .collect();
        (views, ledger::total_minutes(intervals, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn resolved_total_matches_view_sum() {
        let base = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let intervals = vec![
            SessionInterval {
                started_at: base,
                ended_at: Some(base + Duration::minutes(10)),
                duration_minutes: Some(10.0),
            },
            SessionInterval {
                started_at: base + Duration::minutes(20),
                ended_at: None,
                duration_minutes: None,
            },
        ];
        let now = base + Duration::minutes(25);
        let (views, total) = ActivitySnapshot::resolve_sessions(&intervals, now);

        assert_eq!(views.len(), 2);
        let sum: f64 = views.iter().map(|v| v.duration_minutes).sum();
        assert!((total - sum).abs() < f64::EPSILON);
        assert!((total - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_serializes_open_session_with_null_end() {
        let base = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let view = SessionView::from_interval(
            &SessionInterval {
                started_at: base,
                ended_at: None,
                duration_minutes: None,
            },
            base + Duration::seconds(30),
        );
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["ended_at"].is_null());
        assert!((json["duration_minutes"].as_f64().unwrap() - 0.5).abs() < f64::EPSILON);
    }
}
