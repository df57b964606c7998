//! Output formatting utilities for CLI.

#![allow(clippy::format_push_string)]

use super::{CliError, OutputFormat};
use noosphere::batch::{BatchSummary, GameSummary};
use noosphere::report::render_summary;
use noosphere::{FactionId, GameState};
use serde::Serialize;

/// Render a single game in the requested format.
pub(super) fn format_game(state: &GameState, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(render_summary(state)),
        OutputFormat::Json => {
            let summary = GameSummary::from_state(state);
            Ok(serde_json::to_string_pretty(&summary)?)
        }
    }
}

/// JSON-serializable per-faction batch stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonBatchFaction {
    /// Faction id.
    faction: FactionId,
    /// Agent command line, or `idle`.
    agent: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final score.
    avg_score: f64,
    /// Average forfeited sub-turns per game.
    avg_failed_sub_turns: f64,
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonBatchResult {
    /// Total games played.
    games_played: u64,
    /// Per-faction statistics.
    factions: Vec<JsonBatchFaction>,
    /// Number of draws.
    draws: u64,
    /// Wins by knowledge-junction control.
    knowledge_control: u64,
    /// Wins by annihilation.
    annihilation: u64,
    /// Games decided by the turn limit.
    turn_limit: u64,
    /// Games that failed to set up.
    setup_failures: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

impl JsonBatchResult {
    /// Create from a summary and the agent command lines.
    pub(super) fn from_summary(summary: &BatchSummary, agents: &[String; 2]) -> Self {
        let factions = FactionId::ALL
            .into_iter()
            .map(|id| JsonBatchFaction {
                faction: id,
                agent: agents[id.index()].clone(),
                wins: summary.wins[id.index()],
                win_rate: summary.win_rate(id),
                avg_score: summary.avg_score(id),
                avg_failed_sub_turns: summary.avg_failed_sub_turns(id),
            })
            .collect();

        Self {
            games_played: summary.games_played,
            factions,
            draws: summary.draws,
            knowledge_control: summary.by_condition[0],
            annihilation: summary.by_condition[1],
            turn_limit: summary.by_condition[2],
            setup_failures: summary.setup_failures,
            avg_turns: summary.avg_turns(),
        }
    }
}

/// Format batch stats as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_batch_text(summary: &BatchSummary, agents: &[String; 2]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Batch Results ({} games)\n", summary.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for id in FactionId::ALL {
        output.push_str(&format!(
            "  {id} ({}): {:.1}% ({} wins)\n",
            agents[id.index()],
            summary.win_rate(id) * 100.0,
            summary.wins[id.index()]
        ));
    }
    let draw_rate = if summary.games_played == 0 {
        0.0
    } else {
        summary.draws as f64 / summary.games_played as f64 * 100.0
    };
    output.push_str(&format!("  Draws: {} ({draw_rate:.1}%)\n\n", summary.draws));

    output.push_str("Decided by:\n");
    output.push_str(&format!("  Knowledge control: {}\n", summary.by_condition[0]));
    output.push_str(&format!("  Annihilation: {}\n", summary.by_condition[1]));
    output.push_str(&format!("  Turn limit: {}\n\n", summary.by_condition[2]));

    output.push_str("Average Scores:\n");
    for id in FactionId::ALL {
        output.push_str(&format!(
            "  {id}: {:.1} ({:.2} forfeited sub-turns/game)\n",
            summary.avg_score(id),
            summary.avg_failed_sub_turns(id)
        ));
    }

    output.push_str(&format!("\nAverage Game Length: {:.1} turns\n", summary.avg_turns()));
    if summary.setup_failures > 0 {
        output.push_str(&format!("Setup failures: {}\n", summary.setup_failures));
    }

    output
}
