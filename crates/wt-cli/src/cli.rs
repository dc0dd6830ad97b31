//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wt_core::ActivityStatus;

/// Activity timer.
///
/// Tracks timed work activities with a start/pause/complete lifecycle.
/// Starting an activity pauses whatever else the user had running, so at
/// most one activity accrues time at any moment.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this user instead of the configured one.
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new activity.
    New {
        /// Free-text description of the work.
        description: Option<String>,

        /// Category the activity counts against.
        #[arg(long)]
        category: Option<String>,

        /// Start the timer immediately.
        #[arg(long)]
        start: bool,
    },

    /// Start (or resume) an activity's timer.
    Start {
        /// The activity ID.
        activity: String,
    },

    /// Pause a running activity.
    Pause {
        /// The activity ID.
        activity: String,
    },

    /// Complete an activity.
    Complete {
        /// The activity ID.
        activity: String,

        /// Final count to record.
        #[arg(long)]
        count: Option<i64>,

        /// Closing notes; replaces the description.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show one activity with its sessions.
    Show {
        /// The activity ID.
        activity: String,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List the user's activities.
    List {
        /// Filter by status (started, paused, completed).
        #[arg(long)]
        status: Option<ActivityStatus>,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show the currently running activity, if any.
    Status,

    /// Delete an activity and its sessions.
    Delete {
        /// The activity ID.
        activity: String,
    },
}
