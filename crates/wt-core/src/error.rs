//! Error taxonomy for timer operations.

use thiserror::Error;

use crate::lifecycle::{ActivityStatus, TimerAction};

/// Errors returned by timer transitions.
///
/// `NotFound` and `InvalidStateTransition` are terminal for the call and
/// rendered to the user. `ConcurrencyConflict` is safe to retry after
/// re-reading: session closes are idempotent and every transition
/// re-validates against the current status. Anomalous (negative) intervals
/// are not errors at all; the ledger clamps them to zero and logs a warning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The activity does not exist or belongs to another user.
    #[error("activity not found: {activity_id}")]
    NotFound { activity_id: String },

    /// The requested transition is illegal from the current status.
    #[error("cannot {action} an activity in status {from}")]
    InvalidStateTransition {
        from: ActivityStatus,
        action: TimerAction,
    },

    /// Another writer changed the activity between read and update.
    #[error("activity {activity_id} changed concurrently; re-read and retry")]
    ConcurrencyConflict { activity_id: String },
}
