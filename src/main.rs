//! Noosphere CLI - Command-line interface for running and inspecting games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use noosphere::MapType;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Noosphere - a two-faction conquest engine driven by external agents
#[derive(Parser, Debug)]
#[command(name = "noosphere")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a single game
    Run {
        /// Map template: skirmish or continental
        #[arg(short, long, default_value = "skirmish")]
        map: MapType,

        /// Hide each faction's view of the enemy
        #[arg(long)]
        fog: bool,

        /// Random seed (default: clock)
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        engine: cli::EngineArgs,

        #[command(flatten)]
        play: cli::run::PlayArgs,
    },

    /// Continue a saved game
    Resume {
        /// Save file written by `run --save`
        #[arg(required = true)]
        save_file: std::path::PathBuf,

        #[command(flatten)]
        engine: cli::EngineArgs,

        #[command(flatten)]
        play: cli::run::PlayArgs,
    },

    /// Play many seeded games in parallel and aggregate the results
    Batch {
        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Map template: skirmish or continental
        #[arg(short, long, default_value = "skirmish")]
        map: MapType,

        /// Hide each faction's view of the enemy
        #[arg(long)]
        fog: bool,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        #[command(flatten)]
        engine: cli::EngineArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Summarize a saved game
    Inspect {
        /// Save file
        #[arg(required = true)]
        save_file: std::path::PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let result = match args.command {
        Commands::Run {
            map,
            fog,
            seed,
            engine,
            play,
        } => cli::run::execute(map, fog, seed, engine, play),

        Commands::Resume {
            save_file,
            engine,
            play,
        } => cli::run::execute_resume(save_file, engine, play),

        Commands::Batch {
            games,
            map,
            fog,
            seed,
            threads,
            engine,
            format,
            progress,
        } => cli::batch::execute(games, map, fog, seed, threads, engine, format, progress),

        Commands::Inspect { save_file, format } => cli::inspect::execute(save_file, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
