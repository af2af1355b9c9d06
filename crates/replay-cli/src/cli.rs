//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use replay_core::{Granularity, Metric};

/// Listening-history statistics explorer.
///
/// Reads the aggregated listening documents produced by the ingest
/// pipeline and renders bucketed statistics per song, per artist, or
/// over the full history.
#[derive(Debug, Parser)]
#[command(name = "replay", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Statistics for one song.
    Song {
        /// The song's track id in the store.
        id: String,

        #[command(flatten)]
        options: ReportOptions,
    },

    /// Statistics for one artist, across all of their tracks.
    Artist {
        /// The artist id in the store.
        id: String,

        #[command(flatten)]
        options: ReportOptions,
    },

    /// Statistics over the full listening history.
    History {
        #[command(flatten)]
        options: ReportOptions,
    },
}

/// Options shared by all report subcommands.
#[derive(Debug, Args)]
pub struct ReportOptions {
    /// Bucket granularity: month or year.
    #[arg(short, long, default_value = "month")]
    pub granularity: Granularity,

    /// Metric to chart: counts, times, uq_songs, uq_artists.
    #[arg(short, long, default_value = "counts")]
    pub metric: Metric,

    /// Output the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}
