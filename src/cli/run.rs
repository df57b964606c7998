//! Run and resume command implementations.

#![allow(clippy::needless_pass_by_value)]

use super::agents::build_pair;
use super::output::format_game;
use super::{seed_or_clock, CliError, EngineArgs, OutputFormat};
use noosphere::persistence::{load_game, save_game};
use noosphere::{build_game, Engine, GameState, MapType, Phase, StepOutcome};
use std::path::PathBuf;

/// Options for how far to play and where the result goes.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArgs {
    /// Stop after this many full turns and save instead of finishing
    #[arg(long)]
    pub(crate) stop_after: Option<u32>,

    /// Save the final (or stopped) state to this file
    #[arg(long)]
    pub(crate) save: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub(crate) format: OutputFormat,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the config, map, or save file fails.
pub(crate) fn execute(
    map: MapType,
    fog: bool,
    seed: Option<u64>,
    engine_args: EngineArgs,
    play: PlayArgs,
) -> Result<(), CliError> {
    let config = engine_args.engine_config()?;
    let seed = seed_or_clock(seed);
    let state = build_game(map, fog, &config, seed)?;
    let [agent_a, agent_b] = build_pair(&engine_args, &config);
    tracing::info!(
        %map,
        fog,
        seed,
        agent_a = agent_a.name(),
        agent_b = agent_b.name(),
        "starting game"
    );
    let engine = Engine::new(state, config, agent_a, agent_b);
    play_out(engine, &play)
}

/// Execute the resume command.
///
/// # Errors
///
/// Returns an error if the save file cannot be loaded or written.
pub(crate) fn execute_resume(
    save_file: PathBuf,
    engine_args: EngineArgs,
    play: PlayArgs,
) -> Result<(), CliError> {
    let mut config = engine_args.engine_config()?;
    let mut state = load_game(&save_file)?;
    if state.is_game_over() {
        return Err(CliError::new(format!(
            "{} holds a finished game",
            save_file.display()
        )));
    }
    if let Some(turns) = engine_args.max_turns {
        state.max_turns = turns;
    }
    // The saved rules are the rules of this game.
    config.rules = state.rules;
    state.is_paused = false;

    let [agent_a, agent_b] = build_pair(&engine_args, &config);
    tracing::info!(
        path = %save_file.display(),
        turn = state.turn,
        phase = %state.current_phase,
        "resuming game"
    );
    let engine = Engine::new(state, config, agent_a, agent_b);
    play_out(engine, &play)
}

/// Drive an engine to the end, or to the stop turn, then report.
fn play_out(mut engine: Engine, play: &PlayArgs) -> Result<(), CliError> {
    let stop_turn = play
        .stop_after
        .map(|turns| engine.state().turn.saturating_add(turns));

    loop {
        if let Some(stop) = stop_turn {
            let state = engine.state();
            if state.turn >= stop && state.current_phase == Phase::Fluctuation {
                tracing::info!(turn = state.turn, "stopping before the next turn");
                break;
            }
        }
        match engine.step() {
            StepOutcome::Advanced => {}
            StepOutcome::GameOver(winner) => {
                tracing::info!(%winner, "game finished");
                break;
            }
            StepOutcome::Paused => break,
        }
    }

    let state = engine.into_state();
    if let Some(path) = &play.save {
        save_game(&state, path)?;
    }
    print_state(&state, play.format)
}

fn print_state(state: &GameState, format: OutputFormat) -> Result<(), CliError> {
    println!("{}", format_game(state, format)?);
    Ok(())
}
