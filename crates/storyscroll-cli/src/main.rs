use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storyscroll_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "storyscroll")]
#[command(author, version, about = "Scroll through a step-by-step story in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the configured log level (RUST_LOG still wins)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a story in the terminal
    Run {
        /// Story file (TOML)
        story: PathBuf,
        /// Snap between steps instead of animating
        #[arg(long)]
        reduced_motion: bool,
    },
    /// Print the scroll layout of a story for a given terminal size
    Inspect {
        /// Story file (TOML)
        story: PathBuf,
        /// Viewport height in rows
        #[arg(long, default_value_t = 40)]
        viewport: u32,
        /// Pinned section height in rows
        #[arg(long, default_value_t = 12)]
        pinned: u32,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Validate a story and load every asset it references
    Check {
        /// Story file (TOML)
        story: PathBuf,
    },
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load()?;
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }

    // The terminal UI owns the screen, so it logs to a file
    init_logging(&config, matches!(cli.command, Commands::Run { .. }))?;

    match cli.command {
        Commands::Run {
            story,
            reduced_motion,
        } => commands::run::run(config, &story, reduced_motion).await,
        Commands::Inspect {
            story,
            viewport,
            pinned,
            json,
        } => commands::inspect::run(&config, &story, viewport, pinned, json),
        Commands::Check { story } => commands::check::run(&config, &story).await,
        Commands::InitConfig { force } => commands::init_config::run(force),
    }
}

fn init_logging(config: &AppConfig, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if to_file {
        let path = config.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
