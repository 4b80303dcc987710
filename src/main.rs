use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use songplays::cli::load::Dataset;
use songplays::cli::{load, reset, run, stats};
use songplays::config::Config;
use songplays::store::WarehouseStore;

#[derive(Parser)]
#[command(name = "songplays")]
#[command(about = "Load song metadata and listening logs into a star schema")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "songplays.yaml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load song files, then log files
    Run {
        /// Song data directory (overrides config)
        #[arg(long)]
        song_dir: Option<PathBuf>,

        /// Log data directory (overrides config)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Load a single dataset from a directory
    Load {
        #[arg(value_enum)]
        dataset: Dataset,

        /// Directory searched recursively for input files
        dir: PathBuf,
    },

    /// Drop and recreate all tables
    Reset,

    /// Show row counts per table
    Stats,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // Load config
    let config = Config::load(&cli.config).context("Failed to load config")?;

    // Initialize store
    let db_path = config.database_path();
    let mut store = WarehouseStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let pattern = config.data.pattern.as_str();

    match cli.command {
        Commands::Run { song_dir, log_dir } => {
            let song_dir = song_dir.unwrap_or_else(|| config.song_dir());
            let log_dir = log_dir.unwrap_or_else(|| config.log_dir());
            run::run(&mut store, &song_dir, &log_dir, pattern)?;
        }
        Commands::Load { dataset, dir } => {
            load::run(&mut store, dataset, &dir, pattern)?;
        }
        Commands::Reset => {
            reset::run(&store)?;
        }
        Commands::Stats => {
            stats::run(&store)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("songplays=debug,warn")
    } else {
        EnvFilter::new("songplays=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
