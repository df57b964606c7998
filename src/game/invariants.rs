//! Game invariants - sanity checks that detect engine bugs.
//!
//! Agent output can never trigger these: bad actions are rejected by the
//! validator before they touch the state. A violation here means the engine
//! itself mutated something it should not have.

use crate::game::{graph, FactionId, GameState, Owner, Phase};

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// What is wrong, naming the node or faction.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invariant broken: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Collect every invariant the state breaks.
///
/// An empty list means the state is consistent.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (key, node) in &state.nodes {
        if *key != node.id {
            violations.push(violation(format!(
                "Node stored under {key} has id {}",
                node.id
            )));
        }
        if node.total_units() > node.max_units {
            violations.push(violation(format!(
                "Node {} holds {} units > capacity {}",
                node.id,
                node.total_units(),
                node.max_units
            )));
        }
        if node.is_hub_active && !node.has_fabrication_hub {
            violations.push(violation(format!(
                "Node {} has an active hub but no fabrication hub",
                node.id
            )));
        }
        if node.hub_disconnected_turn.is_some() && !node.is_hub_active {
            violations.push(violation(format!(
                "Node {} tracks a disconnected hub that is not active",
                node.id
            )));
        }
        if node.owner == Owner::Unknown {
            violations.push(violation(format!(
                "Node {} has an Unknown owner outside a filtered view",
                node.id
            )));
        }
        if node.connections.contains(&node.id) {
            violations.push(violation(format!("Node {} is connected to itself", node.id)));
        }
    }

    if let Some((from, to)) = graph::find_broken_edge(&state.nodes) {
        violations.push(violation(format!("Edge {from} -> {to} has no reverse")));
    }

    for faction in FactionId::ALL {
        if state.faction(faction).id != faction {
            violations.push(violation(format!(
                "Faction slot {faction} holds {}",
                state.faction(faction).id
            )));
        }
    }

    if state.turn == 0 {
        violations.push(violation("Turn counter is 0".to_string()));
    }
    if state.winner.is_some() != (state.current_phase == Phase::GameOver) {
        violations.push(violation(format!(
            "Winner {:?} inconsistent with phase {}",
            state.winner, state.current_phase
        )));
    }
    if state.system_log.len() > state.system_log_cap {
        violations.push(violation(format!(
            "System log holds {} entries > cap {}",
            state.system_log.len(),
            state.system_log_cap
        )));
    }
    if state.battle_log.len() > state.battle_log_cap {
        violations.push(violation(format!(
            "Battle log holds {} entries > cap {}",
            state.battle_log.len(),
            state.battle_log_cap
        )));
    }

    violations
}

/// Panic if the state breaks any invariant.
///
/// Debug builds only.
///
/// # Panics
///
/// The panic message lists every violation.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("broken game invariants:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
