pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lookalike_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lookalike",
    about = "Lookalike product recommendation CLI",
    long_about = "Build the product similarity index from a catalog and query it for lookalike products.",
    after_help = "Examples:\n  lookalike build --catalog data/00_raw/amazon.csv\n  lookalike recommend \"USB Cable\"\n  lookalike doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Build the similarity index from the catalog and save its artifacts")]
    Build {
        #[arg(long, help = "Catalog file (overrides catalog.path)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Artifacts directory (overrides artifacts.dir)")]
        artifacts: Option<PathBuf>,
    },
    #[command(about = "List the products most similar to the named product")]
    Recommend {
        #[arg(help = "Exact product name")]
        name: String,
        #[arg(long, help = "Number of recommendations (overrides recommend.limit)")]
        limit: Option<usize>,
    },
    #[command(about = "List indexed product names")]
    Products {
        #[arg(long, help = "Only names containing this text (case-insensitive)")]
        contains: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Check configuration, catalog presence and artifact readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Build { catalog, artifacts } => commands::build::run(catalog, artifacts),
        Command::Recommend { name, limit } => commands::recommend::run(&name, limit),
        Command::Products { contains } => commands::products::run(contains.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only command payloads. Config errors
/// are reported by the command itself, so logging falls back to defaults here.
fn init_logging() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
