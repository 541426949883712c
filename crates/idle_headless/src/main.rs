//! Headless idle-city runner.
//!
//! Drives the economy core with a wall-clock timer and a file-backed save
//! store, without any UI. Designed for CI verification and balance probes.
//!
//! # Usage
//!
//! ```bash
//! # Run against ./save.json at the default 10 Hz until interrupted
//! cargo run -p idle_headless -- run
//!
//! # Run a one-minute balance probe on a custom catalog
//! cargo run -p idle_headless -- run --catalog data/catalog.ron --duration 60
//!
//! # Validate a catalog file
//! cargo run -p idle_headless -- validate data/catalog.ron
//!
//! # Pretty-print a save file
//! cargo run -p idle_headless -- inspect save.json
//! ```
//!
//! Logs go to stderr; `inspect` and `validate` print their result to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idle_headless::runner::{self, OnInvalidSave, RunConfig};

#[derive(Parser)]
#[command(name = "idle-headless")]
#[command(about = "Headless idle-city economy runner for CI and balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session on a wall-clock timer
    Run {
        /// Save file to load from and autosave to
        #[arg(short, long, default_value = "save.json")]
        save: PathBuf,

        /// RON catalog file (standard catalog if omitted)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Milliseconds per tick
        #[arg(long, default_value = "100")]
        tick_ms: u64,

        /// Stop after this many seconds (runs until killed if omitted)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Seconds between progress log lines
        #[arg(long, default_value = "10")]
        status_every: u64,

        /// What to do when the existing save fails validation
        #[arg(long, value_enum, default_value = "abort")]
        on_invalid_save: OnInvalidSave,
    },

    /// Validate a RON catalog file
    Validate {
        /// Catalog file to check
        catalog: PathBuf,
    },

    /// Decode a save file and print it as pretty JSON
    Inspect {
        /// Save file to decode
        save: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Run {
            save,
            catalog,
            tick_ms,
            duration,
            status_every,
            on_invalid_save,
        } => runner::run(&RunConfig {
            save_path: save,
            catalog_path: catalog,
            tick_ms: tick_ms.max(1),
            duration_secs: duration,
            status_every_secs: status_every,
            on_invalid_save,
        })
        .map(|snapshot| {
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot).unwrap_or_default()
            );
        }),
        Commands::Validate { catalog } => runner::validate_catalog(&catalog).map(|summary| {
            println!("{summary}");
        }),
        Commands::Inspect { save } => runner::inspect_save(&save).map(|rendered| {
            println!("{rendered}");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}
