//! Batch command implementation.

#![allow(clippy::needless_pass_by_value)]

use super::agents::build_pair;
use super::output::{format_batch_text, JsonBatchResult};
use super::{seed_or_clock, CliError, EngineArgs, OutputFormat};
use noosphere::batch::{run_batch, BatchConfig};
use noosphere::MapType;
use std::time::Instant;

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if the config is invalid or output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    games: u64,
    map: MapType,
    fog: bool,
    seed: Option<u64>,
    threads: Option<usize>,
    engine_args: EngineArgs,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let engine = engine_args.engine_config()?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let config = BatchConfig {
        games,
        base_seed: seed_or_clock(seed),
        map_type: map,
        fog_of_war: fog,
        engine,
        progress,
    };
    tracing::info!(games, base_seed = config.base_seed, %map, fog, "starting batch");

    let start = Instant::now();
    let summary = run_batch(&config, || build_pair(&engine_args, &config.engine));
    let duration = start.elapsed();

    let agents = [engine_args.agent_a.clone(), engine_args.agent_b.clone()];
    match format {
        OutputFormat::Text => {
            print!("{}", format_batch_text(&summary, &agents));
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonBatchResult::from_summary(&summary, &agents))?;
            println!("{json}");
        }
    }

    Ok(())
}
