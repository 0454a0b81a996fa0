mod commands;
mod render;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gradesync_core::config::Config;
use gradesync_core::sync::SyncOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gradesync", version)]
#[command(about = "Sync Gradescope assignments into a CalDAV task list")]
struct Cli {
    /// Config file (default: ~/.config/gradesync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs and every unchanged task
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create new tasks and reopen changed ones
    Sync {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what `sync` would do without writing anything
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the server's task calendars
    Calendars,
    /// Print the VTODO generated for each assignment
    Assignments,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { json } => {
            commands::sync::run(&config, SyncOptions { dry_run: false }, json, cli.verbose).await
        }
        Commands::Status { json } => {
            commands::sync::run(&config, SyncOptions { dry_run: true }, json, cli.verbose).await
        }
        Commands::Calendars => commands::calendars::run(&config).await,
        Commands::Assignments => commands::assignments::run(&config).await,
    }
}

/// Logs go to stderr; stdout only carries the report.
fn init_logging(verbose: bool) {
    let default = if verbose { "gradesync=debug" } else { "gradesync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if path.is_none() {
        let default_path = Config::default_path()?;
        if !default_path.exists() {
            Config::create_default_config(&default_path)?;
            info!(path = %default_path.display(), "Created default config file");
        }
    }

    Config::load(path).context(
        "Could not load configuration (set it in the config file or GRADESYNC__* environment variables)",
    )
}
