//! Fluctuation phase: at most one random event per turn.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FluctuationWeights;
use crate::game::{FactionId, GameState, LogLevel, NodeId, Owner, Stack};

/// Entries of the event table, in the order of [`FluctuationWeights::as_array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A faction gains 5..=15 QR.
    QuantumSurge,
    /// A faction loses 5..=10 QR.
    ResonanceDrain,
    /// A faction node gains 1..=3 standard units.
    Reinforcement,
    /// A garrisoned faction node loses 1..=2 units.
    Attrition,
    /// A neutral node gains 1..=2 standard units.
    NeutralResurgence,
}

impl EventKind {
    const TABLE: [EventKind; 5] = [
        EventKind::QuantumSurge,
        EventKind::ResonanceDrain,
        EventKind::Reinforcement,
        EventKind::Attrition,
        EventKind::NeutralResurgence,
    ];
}

/// What a fluctuation phase did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fluctuation {
    /// Nothing happened.
    Stable,
    /// QR changed.
    Treasury {
        /// Event that fired.
        kind: EventKind,
        /// Affected faction.
        faction: FactionId,
        /// Signed change actually applied.
        delta: i64,
    },
    /// A garrison changed.
    Garrison {
        /// Event that fired.
        kind: EventKind,
        /// Affected node.
        node_id: NodeId,
        /// Signed change actually applied.
        delta: i64,
    },
}

impl fmt::Display for Fluctuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fluctuation::Stable => write!(f, "The noosphere is stable"),
            Fluctuation::Treasury {
                kind,
                faction,
                delta,
            } => write!(f, "{kind:?}: {faction} QR {delta:+}"),
            Fluctuation::Garrison {
                kind,
                node_id,
                delta,
            } => write!(f, "{kind:?}: {node_id} units {delta:+}"),
        }
    }
}

/// Pick at most one event from the weighted table.
///
/// The remainder of the unit interval past the weights' sum is a stable turn.
pub fn roll_event(weights: &FluctuationWeights, rng: &mut impl Rng) -> Option<EventKind> {
    let roll: f64 = rng.random();
    let mut threshold = 0.0;
    for (kind, weight) in EventKind::TABLE.iter().zip(weights.as_array()) {
        threshold += weight;
        if roll < threshold {
            return Some(*kind);
        }
    }
    None
}

/// Apply an event to a random eligible target.
///
/// An event with no eligible target degrades to a stable turn.
pub fn apply_event(state: &mut GameState, kind: EventKind, rng: &mut impl Rng) -> Fluctuation {
    match kind {
        EventKind::QuantumSurge => {
            let faction = random_faction(rng);
            let amount = rng.random_range(5..=15);
            state.faction_mut(faction).credit(amount);
            Fluctuation::Treasury {
                kind,
                faction,
                delta: i64::from(amount),
            }
        }
        EventKind::ResonanceDrain => {
            let faction = random_faction(rng);
            let amount = rng.random_range(5..=10);
            let lost = state.faction_mut(faction).drain(amount);
            Fluctuation::Treasury {
                kind,
                faction,
                delta: -i64::from(lost),
            }
        }
        EventKind::Reinforcement => {
            let faction = random_faction(rng);
            let candidates: Vec<NodeId> = state
                .nodes
                .values()
                .filter(|node| node.owner.is(faction) && node.free_capacity() > 0)
                .map(|node| node.id.clone())
                .collect();
            grow(state, kind, &candidates, 1..=3, rng)
        }
        EventKind::NeutralResurgence => {
            let candidates: Vec<NodeId> = state
                .nodes
                .values()
                .filter(|node| node.owner == Owner::Neutral && node.free_capacity() > 0)
                .map(|node| node.id.clone())
                .collect();
            grow(state, kind, &candidates, 1..=2, rng)
        }
        EventKind::Attrition => {
            let candidates: Vec<NodeId> = state
                .nodes
                .values()
                .filter(|node| node.owner.faction().is_some() && node.total_units() > 0)
                .map(|node| node.id.clone())
                .collect();
            let Some(node_id) = candidates.choose(rng).cloned() else {
                return Fluctuation::Stable;
            };
            let amount: u32 = rng.random_range(1..=2);
            let mut owner = None;
            let mut lost = 0;
            if let Some(node) = state.node_mut(&node_id) {
                lost = amount.min(node.total_units());
                node.remove_units(lost);
                owner = node.owner.faction();
            }
            if let Some(owner) = owner {
                state.faction_mut(owner).units_lost += lost;
            }
            Fluctuation::Garrison {
                kind,
                node_id,
                delta: -i64::from(lost),
            }
        }
    }
}

fn random_faction(rng: &mut impl Rng) -> FactionId {
    if rng.random_bool(0.5) {
        FactionId::FactionA
    } else {
        FactionId::FactionB
    }
}

fn grow(
    state: &mut GameState,
    kind: EventKind,
    candidates: &[NodeId],
    range: std::ops::RangeInclusive<u32>,
    rng: &mut impl Rng,
) -> Fluctuation {
    let Some(node_id) = candidates.choose(rng).cloned() else {
        return Fluctuation::Stable;
    };
    let amount = rng.random_range(range);
    let mut added = 0;
    if let Some(node) = state.node_mut(&node_id) {
        added = amount.min(node.free_capacity());
        node.add_units(Stack::new(added, 0));
    }
    Fluctuation::Garrison {
        kind,
        node_id,
        delta: i64::from(added),
    }
}

/// Run the fluctuation phase: draw a random stream, roll, apply, log.
pub fn run_fluctuation(state: &mut GameState, weights: &FluctuationWeights) -> Fluctuation {
    let mut rng = state.next_rng();
    let outcome = match roll_event(weights, &mut rng) {
        Some(kind) => apply_event(state, kind, &mut rng),
        None => Fluctuation::Stable,
    };
    let level = if outcome == Fluctuation::Stable {
        LogLevel::Info
    } else {
        LogLevel::Event
    };
    state.log(level, outcome.to_string());
    outcome
}
