//! ebb CLI - incremental MDX content compiler.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "ebb")]
#[command(about = "Compile MDX content into JavaScript modules")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to ebb.toml config file
    #[arg(short, long, default_value = ebb_source::CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ebb.toml and a sample page in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Compile changed files, keeping the cache between runs
    Dev {
        /// Recompile files as they change
        #[arg(short, long)]
        watch: bool,
    },

    /// Compile every file from scratch
    Build,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Dev { watch } => {
            commands::dev::run(&cli.config, watch).await?;
        }
        Commands::Build => {
            commands::build::run(&cli.config).await?;
        }
    }

    Ok(())
}
