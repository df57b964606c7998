//! Faction state: treasury, aggregates and cumulative counters.

use serde::{Deserialize, Serialize};

use crate::game::{FactionId, Phase};

/// One entry of a faction's commentary log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticalAnalysis {
    /// Turn the analysis was submitted.
    pub turn: u32,
    /// Phase the analysis was submitted in.
    pub phase: Phase,
    /// Free text from the agent.
    pub text: String,
}

/// State for a single faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    /// Which faction this is.
    pub id: FactionId,
    /// Quantum resources available to spend.
    pub qr: u32,

    /// Nodes owned (recomputed at turn end).
    pub nodes_controlled: u32,
    /// Standard units across all owned nodes (recomputed at turn end).
    pub total_standard_units: u32,
    /// Evolved units across all owned nodes (recomputed at turn end).
    pub total_evolved_units: u32,
    /// Knowledge junctions held with a supply line (recomputed at turn end).
    pub kjs_held: u32,
    /// Active fabrication hubs (recomputed at turn end).
    pub active_hubs_count: u32,

    /// Units deployed over the game.
    pub units_purchased: u32,
    /// Units lost in combat and attrition over the game.
    pub units_lost: u32,
    /// Attacks that captured their target.
    pub successful_attacks: u32,
    /// Attacks that were wiped out.
    pub attacks_lost: u32,
    /// Attacks repelled.
    pub successful_defenses: u32,
    /// Nodes lost to attacks.
    pub defenses_lost: u32,
    /// Agent sub-turns that produced a valid batch.
    pub successful_turn_attempts: u32,
    /// Agent sub-turns that exhausted every retry.
    pub failed_turn_attempts: u32,

    /// Consecutive turn-ends holding the required knowledge junctions.
    pub kj_streak: u32,
    /// Agent commentary, oldest first.
    pub tactical_analysis_history: Vec<TacticalAnalysis>,
    /// Reason the most recent agent attempt was rejected.
    pub last_error: Option<String>,
}

impl Faction {
    /// Create a faction with a starting treasury and zeroed counters.
    #[must_use]
    pub fn new(id: FactionId, qr: u32) -> Self {
        Self {
            id,
            qr,
            nodes_controlled: 0,
            total_standard_units: 0,
            total_evolved_units: 0,
            kjs_held: 0,
            active_hubs_count: 0,
            units_purchased: 0,
            units_lost: 0,
            successful_attacks: 0,
            attacks_lost: 0,
            successful_defenses: 0,
            defenses_lost: 0,
            successful_turn_attempts: 0,
            failed_turn_attempts: 0,
            kj_streak: 0,
            tactical_analysis_history: Vec::new(),
            last_error: None,
        }
    }

    /// Standard plus evolved units.
    #[must_use]
    pub const fn total_units(&self) -> u32 {
        self.total_standard_units + self.total_evolved_units
    }

    /// Spend QR.
    ///
    /// # Panics
    ///
    /// Panics if the faction cannot afford `amount`; validation must have
    /// rejected the action first.
    pub fn debit(&mut self, amount: u64) {
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);
        assert!(
            amount <= self.qr,
            "{} cannot spend {amount} QR with {} available",
            self.id,
            self.qr
        );
        self.qr -= amount;
    }

    /// Gain QR.
    pub fn credit(&mut self, amount: u32) {
        self.qr = self.qr.saturating_add(amount);
    }

    /// Lose QR, stopping at zero.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.qr);
        self.qr -= lost;
        lost
    }

    /// Turn-limit score: `qr + nodes*10 + kjs*50 + units*2`.
    #[must_use]
    pub fn score(&self) -> u64 {
        u64::from(self.qr)
            + u64::from(self.nodes_controlled) * 10
            + u64::from(self.kjs_held) * 50
            + u64::from(self.total_units()) * 2
    }
}
