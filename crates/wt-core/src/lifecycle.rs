//! Activity lifecycle state machine.
//!
//! An activity is `started`, `paused`, or `completed`. `completed` is
//! terminal. Approval is an orthogonal flag on the activity record, not a
//! lifecycle state.

use serde::{Deserialize, Serialize};

use crate::error::TimerError;
use crate::types::ValidationError;

/// Lifecycle status of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// The timer is running: exactly one session interval is open.
    Started,
    /// The timer is stopped; the activity can be resumed.
    #[default]
    Paused,
    /// Terminal. No transition leaves this status.
    Completed,
}

impl ActivityStatus {
    /// Returns the string representation for SQL storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(Self::Started),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A requested timer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerAction {
    Start,
    Pause,
    Complete,
}

impl TimerAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for TimerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimerAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "complete" => Ok(Self::Complete),
            _ => Err(ValidationError::InvalidAction {
                value: s.to_string(),
            }),
        }
    }
}

/// Checks that `action` is legal from `current`.
///
/// Rules:
/// - `start` is allowed unless the activity is completed. Starting an
///   already-running activity is legal; only the exclusivity side effects
///   apply.
/// - `pause` is only allowed from `started`. Pausing a paused or completed
///   activity is an error, not a silent no-op, so client bugs surface.
/// - `complete` is allowed from `started` or `paused`.
pub const fn check_transition(
    current: ActivityStatus,
    action: TimerAction,
) -> Result<(), TimerError> {
    let allowed = match action {
        TimerAction::Start | TimerAction::Complete => !current.is_terminal(),
        TimerAction::Pause => matches!(current, ActivityStatus::Started),
    };
    if allowed {
        Ok(())
    } else {
        Err(TimerError::InvalidStateTransition {
            from: current,
            action,
        })
    }
}
