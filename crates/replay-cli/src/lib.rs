//! Listening-history report CLI library.
//!
//! Plays the collaborator roles around `replay-core`: a filesystem
//! document store, configuration, and terminal rendering.

mod cli;
pub mod commands;
mod config;
mod store;

pub use cli::{Cli, Commands, ReportOptions};
pub use config::Config;
pub use store::DocumentStore;
