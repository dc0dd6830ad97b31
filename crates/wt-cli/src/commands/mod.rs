//! CLI subcommand implementations.

pub mod complete;
pub mod delete;
pub mod list;
pub mod new;
pub mod pause;
pub mod show;
pub mod start;
pub mod status;
mod util;
