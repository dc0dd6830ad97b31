//! Core domain logic for the activity timer.
//!
//! This crate contains the fundamental types and logic for:
//! - Lifecycle: the activity state machine and its legal transitions
//! - Ledger: session interval accounting and duration totals
//! - Snapshots: the serialized activity view returned to callers
//!
//! Everything here is pure; persistence and transaction boundaries live in
//! `wt-db`.

pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod snapshot;
pub mod types;

pub use error::TimerError;
pub use ledger::SessionInterval;
pub use lifecycle::{ActivityStatus, TimerAction, check_transition};
pub use snapshot::{ActivitySnapshot, SessionView};
pub use types::{ActivityId, UserId, ValidationError};
