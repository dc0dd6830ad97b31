//! Session interval accounting.
//!
//! An activity accumulates time as a set of sessions: closed intervals with
//! a recorded duration, plus at most one open interval that is still
//! accruing. Total elapsed time is the sum of interval spans, never a single
//! wall-clock delta, so pauses do not count.
//!
//! Every duration the system reports goes through [`total_minutes`] so
//! detail views, listings, and reports agree. A stored `duration_minutes` is
//! authoritative when present; the timestamps are the fallback when it is
//! absent.

use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// One start-to-pause-or-complete span belonging to an activity.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInterval {
    pub started_at: DateTime<Utc>,
    /// `None` means the interval is open and still accruing time.
    pub ended_at: Option<DateTime<Utc>>,
    /// Precomputed span in fractional minutes, set when the interval closes.
    pub duration_minutes: Option<f64>,
}

impl SessionInterval {
    /// Whether the interval is still accruing time.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Computes the span between two timestamps in fractional minutes.
///
/// Sub-minute spans stay fractional (30 seconds is 0.5, not 0). A span that
/// comes out negative clamps to zero; the second element reports whether
/// clamping happened so callers can log the anomaly.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond counts are far below f64's exact-integer range"
)]
pub fn span_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> (f64, bool) {
    let millis = ended_at.signed_duration_since(started_at).num_milliseconds();
    if millis < 0 {
        (0.0, true)
    } else {
        (millis as f64 / MILLIS_PER_MINUTE, false)
    }
}

/// Minutes contributed by a single interval as of `now`.
///
/// Closed intervals use their stored duration when present and derive from
/// timestamps otherwise. An open interval accrues `now - started_at`.
#[must_use]
pub fn interval_minutes(interval: &SessionInterval, now: DateTime<Utc>) -> f64 {
    match (interval.ended_at, interval.duration_minutes) {
        (Some(_), Some(minutes)) => minutes.max(0.0),
        (Some(ended_at), None) => clamped_span(interval.started_at, ended_at),
        (None, _) => clamped_span(interval.started_at, now),
    }
}

/// Total minutes accumulated across all intervals as of `now`.
///
/// Never negative; 0.0 when there are no intervals.
#[must_use]
pub fn total_minutes(intervals: &[SessionInterval], now: DateTime<Utc>) -> f64 {
    intervals
        .iter()
        .map(|interval| interval_minutes(interval, now))
        .sum()
}

/// Returns the open interval, if any.
#[must_use]
pub fn open_interval(intervals: &[SessionInterval]) -> Option<&SessionInterval> {
    intervals.iter().find(|interval| interval.is_open())
}

fn clamped_span(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> f64 {
    let (minutes, anomalous) = span_minutes(started_at, ended_at);
    if anomalous {
        tracing::warn!(
            %started_at,
            %ended_at,
            "interval ends before it starts; clamping duration to zero"
        );
    }
    minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    fn closed(start_offset_s: i64, duration_minutes: f64) -> SessionInterval {
        let started_at = base() + Duration::seconds(start_offset_s);
        SessionInterval {
            started_at,
            ended_at: Some(started_at + Duration::seconds((duration_minutes * 60.0) as i64)),
            duration_minutes: Some(duration_minutes),
        }
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact sums are the property under test")]
    fn total_is_exact_sum_of_closed_durations() {
        let intervals = vec![closed(0, 10.0), closed(700, 2.5), closed(1000, 0.25)];
        assert_eq!(total_minutes(&intervals, base()), 12.75);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact value is the property under test")]
    fn thirty_seconds_is_half_a_minute() {
        let interval = SessionInterval {
            started_at: base(),
            ended_at: Some(base() + Duration::seconds(30)),
            duration_minutes: None,
        };
        assert_eq!(interval_minutes(&interval, base()), 0.5);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact value is the property under test")]
    fn open_interval_accrues_to_now() {
        let intervals = vec![SessionInterval {
            started_at: base(),
            ended_at: None,
            duration_minutes: None,
        }];
        let now = base() + Duration::minutes(10);
        assert_eq!(total_minutes(&intervals, now), 10.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact value is the property under test")]
    fn stored_duration_is_authoritative_over_timestamps() {
        // The stored value wins even when the timestamps disagree.
        let interval = SessionInterval {
            started_at: base(),
            ended_at: Some(base() + Duration::minutes(99)),
            duration_minutes: Some(5.0),
        };
        assert_eq!(interval_minutes(&interval, base()), 5.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact value is the property under test")]
    fn negative_spans_clamp_to_zero() {
        let (minutes, anomalous) = span_minutes(base(), base() - Duration::seconds(30));
        assert_eq!(minutes, 0.0);
        assert!(anomalous);

        // A negative stored duration clamps the same way.
        let interval = SessionInterval {
            started_at: base(),
            ended_at: Some(base() + Duration::minutes(1)),
            duration_minutes: Some(-3.0),
        };
        assert_eq!(interval_minutes(&interval, base()), 0.0);

        // An open interval started in the future accrues nothing.
        let open = SessionInterval {
            started_at: base() + Duration::minutes(5),
            ended_at: None,
            duration_minutes: None,
        };
        assert_eq!(interval_minutes(&open, base()), 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "exact value is the property under test")]
    fn no_intervals_means_zero() {
        assert_eq!(total_minutes(&[], base()), 0.0);
    }

    #[test]
    fn open_interval_is_found() {
        let mut intervals = vec![closed(0, 1.0), closed(120, 1.0)];
        assert!(open_interval(&intervals).is_none());

        intervals.push(SessionInterval {
            started_at: base() + Duration::minutes(10),
            ended_at: None,
            duration_minutes: None,
        });
        let open = open_interval(&intervals).unwrap();
        assert!(open.is_open());
        assert_eq!(open.started_at, base() + Duration::minutes(10));
    }

    #[test]
    fn closed_interval_without_stored_duration_derives_from_timestamps() {
        let interval = SessionInterval {
            started_at: base(),
            ended_at: Some(base() + Duration::seconds(90)),
            duration_minutes: None,
        };
        assert!((interval_minutes(&interval, base()) - 1.5).abs() < f64::EPSILON);
    }
}
