//! Win-condition evaluation at turn end.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::game::{graph, FactionId, GameState, WinCondition, Winner};

/// Knowledge-junction thresholds of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictoryRules {
    /// Connected junctions a faction must hold at turn end.
    pub required_kjs: u32,
    /// Consecutive qualifying turn-ends needed to win.
    pub streak_target: u32,
}

impl VictoryRules {
    /// Create thresholds.
    #[must_use]
    pub const fn new(required_kjs: u32, streak_target: u32) -> Self {
        Self {
            required_kjs,
            streak_target,
        }
    }
}

/// Whether `faction` has no units and no command node left.
#[must_use]
pub fn is_eliminated(state: &GameState, faction: FactionId) -> bool {
    let mut units = 0;
    let mut command_nodes = 0;
    for node in graph::owned_by(&state.nodes, faction) {
        units += node.total_units();
        if node.is_command_node {
            command_nodes += 1;
        }
    }
    units == 0 && command_nodes == 0
}

/// Update streaks and check the win conditions in order.
///
/// Expects faction aggregates to be fresh. The first condition that decides
/// the game wins:
///
/// 1. knowledge-junction streak reaching the map's target
/// 2. annihilation (both eliminated at once is a draw)
/// 3. turn limit, decided on score (equal scores draw)
pub fn evaluate_turn_end(state: &mut GameState) -> Option<(Winner, WinCondition)> {
    let rules = state.victory;
    let mut reached = Vec::new();
    for faction in FactionId::ALL {
        let record = state.faction_mut(faction);
        if record.kjs_held >= rules.required_kjs {
            record.kj_streak += 1;
        } else {
            record.kj_streak = 0;
        }
        if record.kj_streak >= rules.streak_target {
            reached.push(faction);
        }
    }
    // Map thresholds keep both from qualifying together; if a custom map
    // allows it, neither wins on junctions.
    if let [faction] = reached.as_slice() {
        return Some((Winner::from(*faction), WinCondition::KnowledgeControl));
    }

    let a_out = is_eliminated(state, FactionId::FactionA);
    let b_out = is_eliminated(state, FactionId::FactionB);
    match (a_out, b_out) {
        (true, true) => return Some((Winner::Draw, WinCondition::Annihilation)),
        (true, false) => return Some((Winner::FactionB, WinCondition::Annihilation)),
        (false, true) => return Some((Winner::FactionA, WinCondition::Annihilation)),
        (false, false) => {}
    }

    if state.turn >= state.max_turns {
        let a = state.faction(FactionId::FactionA).score();
        let b = state.faction(FactionId::FactionB).score();
        let winner = match a.cmp(&b) {
            Ordering::Greater => Winner::FactionA,
            Ordering::Less => Winner::FactionB,
            Ordering::Equal => Winner::Draw,
        };
        return Some((winner, WinCondition::TurnLimit));
    }

    None
}
