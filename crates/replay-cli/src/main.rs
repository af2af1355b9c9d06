use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use replay_core::BucketGrid;
use tracing_subscriber::EnvFilter;

use replay_cli::commands::report;
use replay_cli::{Cli, Commands, Config, DocumentStore};

/// Load config and open the document store.
fn open_store(config_path: Option<&Path>) -> Result<(DocumentStore, BucketGrid)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let grid = BucketGrid::new(config.bucket_range()?);
    let store = DocumentStore::new(config.data_dir.clone());
    Ok((store, grid))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Song { id, options }) => {
            let (store, grid) = open_store(cli.config.as_deref())?;
            report::song(&store, grid, id, options).await?;
        }
        Some(Commands::Artist { id, options }) => {
            let (store, grid) = open_store(cli.config.as_deref())?;
            report::artist(&store, grid, id, options).await?;
        }
        Some(Commands::History { options }) => {
            let (store, grid) = open_store(cli.config.as_deref())?;
            report::history(&store, grid, options).await?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
