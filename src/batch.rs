//! Many independent games in parallel.
//!
//! Games share nothing but the read-only config, so they fan out over
//! rayon's pool. Each worker folds results into its own [`BatchSummary`] and
//! the partial summaries are merged at the end.

#![allow(clippy::cast_precision_loss)]

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::agent::AgentGateway;
use crate::config::EngineConfig;
use crate::engine::{Engine, StepOutcome};
use crate::error::MapError;
use crate::game::{FactionId, GameState, WinCondition, Winner};
use crate::maps::{build_game, MapType};

/// Settings shared by every game of a batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of games.
    pub games: u64,
    /// Seed of the first game; game `i` uses `base_seed + i`.
    pub base_seed: u64,
    /// Map template.
    pub map_type: MapType,
    /// Fog of war for every game.
    pub fog_of_war: bool,
    /// Engine settings.
    pub engine: EngineConfig,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 100,
            base_seed: 0,
            map_type: MapType::Skirmish,
            fog_of_war: false,
            engine: EngineConfig::default(),
            progress: false,
        }
    }
}

/// Outcome of one finished game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    /// Seed the game ran with.
    pub seed: u64,
    /// Result.
    pub winner: Winner,
    /// How the result was reached.
    pub win_condition: Option<WinCondition>,
    /// Turn on which the game ended.
    pub turns: u32,
    /// Final scores, faction A first.
    pub scores: [u64; 2],
    /// Sub-turns each faction forfeited after exhausting its retries.
    pub failed_sub_turns: [u32; 2],
}

impl GameSummary {
    /// Summarize a state. An undecided game is reported as a draw.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        let a = state.faction(FactionId::FactionA);
        let b = state.faction(FactionId::FactionB);
        Self {
            seed: state.seed,
            winner: state.winner.unwrap_or(Winner::Draw),
            win_condition: state.win_condition,
            turns: state.turn,
            scores: [a.score(), b.score()],
            failed_sub_turns: [a.failed_turn_attempts, b.failed_turn_attempts],
        }
    }
}

/// Aggregated statistics.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Games completed.
    pub games_played: u64,
    /// Wins per faction, A first.
    pub wins: [u64; 2],
    /// Drawn games.
    pub draws: u64,
    /// Wins per condition: knowledge control, annihilation, turn limit.
    pub by_condition: [u64; 3],
    /// Games that could not be set up.
    pub setup_failures: u64,
    total_turns: u64,
    total_scores: [u64; 2],
    total_failed_sub_turns: [u64; 2],
}

impl BatchSummary {
    /// Fold one game in.
    pub fn add(&mut self, game: &GameSummary) {
        self.games_played += 1;
        self.total_turns += u64::from(game.turns);
        match game.winner {
            Winner::FactionA => self.wins[0] += 1,
            Winner::FactionB => self.wins[1] += 1,
            Winner::Draw => self.draws += 1,
        }
        match game.win_condition {
            Some(WinCondition::KnowledgeControl) => self.by_condition[0] += 1,
            Some(WinCondition::Annihilation) => self.by_condition[1] += 1,
            Some(WinCondition::TurnLimit) => self.by_condition[2] += 1,
            None => {}
        }
        for i in 0..2 {
            self.total_scores[i] += game.scores[i];
            self.total_failed_sub_turns[i] += u64::from(game.failed_sub_turns[i]);
        }
    }

    /// Merge another partial summary.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.draws += other.draws;
        self.setup_failures += other.setup_failures;
        self.total_turns += other.total_turns;
        for i in 0..2 {
            self.wins[i] += other.wins[i];
            self.total_scores[i] += other.total_scores[i];
            self.total_failed_sub_turns[i] += other.total_failed_sub_turns[i];
        }
        for i in 0..3 {
            self.by_condition[i] += other.by_condition[i];
        }
    }

    /// Share of games won by a faction, 0.0 to 1.0.
    #[must_use]
    pub fn win_rate(&self, faction: FactionId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins[faction.index()] as f64 / self.games_played as f64
    }

    /// Mean final score of a faction.
    #[must_use]
    pub fn avg_score(&self, faction: FactionId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_scores[faction.index()] as f64 / self.games_played as f64
    }

    /// Mean forfeited sub-turns per game for a faction.
    #[must_use]
    pub fn avg_failed_sub_turns(&self, faction: FactionId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_failed_sub_turns[faction.index()] as f64 / self.games_played as f64
    }

    /// Mean game length.
    #[must_use]
    pub fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// Play one game to the end without pausing.
///
/// # Errors
///
/// Returns an error if the map template is invalid.
pub fn play_game(
    seed: u64,
    map_type: MapType,
    fog_of_war: bool,
    config: &EngineConfig,
    agents: [Box<dyn AgentGateway>; 2],
) -> Result<GameSummary, MapError> {
    let state = build_game(map_type, fog_of_war, config, seed)?;
    let [agent_a, agent_b] = agents;
    let mut engine = Engine::new(state, config.clone(), agent_a, agent_b);
    let winner = match engine.run() {
        StepOutcome::GameOver(winner) => winner,
        // A fresh engine is never paused.
        StepOutcome::Advanced | StepOutcome::Paused => Winner::Draw,
    };
    let mut summary = GameSummary::from_state(&engine.into_state());
    summary.winner = winner;
    Ok(summary)
}

fn progress_bar(games: u64) -> ProgressBar {
    let bar = ProgressBar::new(games);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

/// Run a batch of games in parallel.
///
/// `agents` is called once per game and must return fresh agents.
pub fn run_batch<F>(config: &BatchConfig, agents: F) -> BatchSummary
where
    F: Fn() -> [Box<dyn AgentGateway>; 2] + Sync,
{
    let bar = config.progress.then(|| progress_bar(config.games));

    let summary = (0..config.games)
        .into_par_iter()
        .fold(BatchSummary::default, |mut local, i| {
            let seed = config.base_seed.wrapping_add(i);
            match play_game(seed, config.map_type, config.fog_of_war, &config.engine, agents()) {
                Ok(game) => local.add(&game),
                Err(error) => {
                    tracing::error!(seed, %error, "game setup failed");
                    local.setup_failures += 1;
                }
            }
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            local
        })
        .reduce(BatchSummary::default, |mut a, b| {
            a.merge(&b);
            a
        });

    if let Some(bar) = bar {
        bar.finish_with_message("done");
    }
    tracing::info!(
        games = summary.games_played,
        draws = summary.draws,
        "batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScriptedAgent;

    fn idle_agents() -> [Box<dyn AgentGateway>; 2] {
        [
            Box::new(ScriptedAgent::idle()),
            Box::new(ScriptedAgent::idle()),
        ]
    }

    #[test]
    fn test_idle_batch_runs_to_turn_limit() {
        let config = BatchConfig {
            games: 4,
            base_seed: 100,
            engine: EngineConfig {
                max_turns: 2,
                ..EngineConfig::default()
            },
            ..BatchConfig::default()
        };
        let summary = run_batch(&config, idle_agents);
        assert_eq!(summary.games_played, 4);
        assert_eq!(summary.wins[0] + summary.wins[1] + summary.draws, 4);
        assert_eq!(summary.by_condition[2], 4);
        assert!((summary.avg_turns() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_adds_up() {
        let game = GameSummary {
            seed: 1,
            winner: Winner::FactionB,
            win_condition: Some(WinCondition::Annihilation),
            turns: 7,
            scores: [10, 90],
            failed_sub_turns: [1, 0],
        };
        let mut left = BatchSummary::default();
        left.add(&game);
        let mut right = BatchSummary::default();
        right.add(&game);
        left.merge(&right);
        assert_eq!(left.games_played, 2);
        assert_eq!(left.wins, [0, 2]);
        assert_eq!(left.by_condition, [0, 2, 0]);
        assert!((left.avg_score(FactionId::FactionB) - 90.0).abs() < f64::EPSILON);
        assert!((left.win_rate(FactionId::FactionA)).abs() < f64::EPSILON);
        assert!((left.avg_failed_sub_turns(FactionId::FactionA) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary_rates() {
        let summary = BatchSummary::default();
        assert!(summary.win_rate(FactionId::FactionA).abs() < f64::EPSILON);
        assert!(summary.avg_turns().abs() < f64::EPSILON);
    }
}
