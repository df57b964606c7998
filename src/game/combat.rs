//! Combat resolution.
//!
//! Attacks are dice duels. Each round both sides roll one die, plus a flat
//! bonus if their stack held any evolved unit when the battle started; the
//! lower roll loses one unit and ties are clashes with no loss. The bonus
//! flag is fixed at battle start and does not change as evolved units die.

use std::collections::VecDeque;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::game::{FactionId, GameState, LogLevel, NodeId, Owner, Stack};

/// Source of six-sided die rolls.
pub trait DiceRoller {
    /// Roll one die, returning 1..=6.
    fn roll_d6(&mut self) -> u32;
}

impl DiceRoller for ChaCha8Rng {
    fn roll_d6(&mut self) -> u32 {
        self.random_range(1..=6)
    }
}

/// Replays a fixed roll sequence, cycling when it runs out.
///
/// Rolls alternate attacker, defender within each round.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}

impl ScriptedDice {
    /// Create from a roll sequence.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is empty or a roll is outside 1..=6.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        let rolls: VecDeque<u32> = rolls.into_iter().collect();
        assert!(!rolls.is_empty(), "scripted dice need at least one roll");
        assert!(
            rolls.iter().all(|r| (1..=6).contains(r)),
            "scripted rolls must be 1..=6"
        );
        Self { rolls }
    }

    /// Attacker always rolls 6, defender always rolls 1.
    #[must_use]
    pub fn attacker_favoured() -> Self {
        Self::new([6, 1])
    }

    /// Attacker always rolls 1, defender always rolls 6.
    #[must_use]
    pub fn defender_favoured() -> Self {
        Self::new([1, 6])
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_d6(&mut self) -> u32 {
        let roll = self.rolls.pop_front().unwrap_or(1);
        self.rolls.push_back(roll);
        roll
    }
}

/// One round of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollDetail {
    /// Round number (1-based).
    pub round: u32,
    /// Attacker's roll including bonus.
    pub attacker_roll: u32,
    /// Defender's roll including bonus.
    pub defender_roll: u32,
    /// Attacking units left after the round.
    pub attacker_remaining: u32,
    /// Defending units left after the round.
    pub defender_remaining: u32,
}

/// Result of [`resolve_combat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Surviving attackers.
    pub attacker: Stack,
    /// Surviving defenders.
    pub defender: Stack,
    /// Per-round trace.
    pub rounds: Vec<DiceRollDetail>,
    /// Whether the attacker takes the node.
    pub captured: bool,
}

impl CombatOutcome {
    /// Units the attacker lost out of `committed`.
    #[must_use]
    pub const fn attacker_losses(&self, committed: Stack) -> u32 {
        committed.total() - self.attacker.total()
    }

    /// Units the defender lost out of `garrison`.
    #[must_use]
    pub const fn defender_losses(&self, garrison: Stack) -> u32 {
        garrison.total() - self.defender.total()
    }
}

/// Immutable record of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleLogEntry {
    /// Turn of the attack.
    pub turn: u32,
    /// Attacking faction.
    pub attacker: FactionId,
    /// Holder of the target before the attack.
    pub defender: Owner,
    /// Source node.
    pub from_node_id: NodeId,
    /// Target node.
    pub to_node_id: NodeId,
    /// Committed attacking stack.
    pub attacking_units: Stack,
    /// Garrison at the target when the battle started.
    pub defending_units: Stack,
    /// Per-round trace.
    pub rounds: Vec<DiceRollDetail>,
    /// Attacking units lost.
    pub attacker_losses: u32,
    /// Defending units lost.
    pub defender_losses: u32,
    /// Whether the target changed hands.
    pub captured: bool,
    /// Survivors sent back to the source because the target was full.
    pub returned_to_source: u32,
}

/// Fight a battle between two stacks.
///
/// `bonus` is added to every roll of a side whose stack started with at least
/// one evolved unit. An empty neutral node falls without a fight.
pub fn resolve_combat(
    attacker: Stack,
    defender: Stack,
    defender_is_neutral: bool,
    bonus: u32,
    dice: &mut dyn DiceRoller,
) -> CombatOutcome {
    if defender.total() == 0 && defender_is_neutral {
        return CombatOutcome {
            attacker,
            defender,
            rounds: Vec::new(),
            captured: attacker.total() > 0,
        };
    }

    let attacker_bonus = if attacker.has_evolved() { bonus } else { 0 };
    let defender_bonus = if defender.has_evolved() { bonus } else { 0 };

    let mut attacking = attacker;
    let mut defending = defender;
    let mut rounds = Vec::new();
    let mut round = 0;

    while attacking.total() > 0 && defending.total() > 0 {
        round += 1;
        let attacker_roll = dice.roll_d6() + attacker_bonus;
        let defender_roll = dice.roll_d6() + defender_bonus;
        if attacker_roll > defender_roll {
            defending.take(1);
        } else if defender_roll > attacker_roll {
            attacking.take(1);
        }
        rounds.push(DiceRollDetail {
            round,
            attacker_roll,
            defender_roll,
            attacker_remaining: attacking.total(),
            defender_remaining: defending.total(),
        });
    }

    CombatOutcome {
        attacker: attacking,
        defender: defending,
        rounds,
        captured: attacking.total() > 0,
    }
}

/// Run a validated attack against the state.
///
/// The committed units leave the source before the battle regardless of the
/// outcome. On capture the survivors occupy the target up to its capacity,
/// the rest return to the source, and any hub on the target shuts down.
///
/// # Panics
///
/// Panics if either node is missing or the source cannot supply `units`;
/// validation must have accepted the attack first.
pub fn process_attack(
    state: &mut GameState,
    attacker: FactionId,
    from: &str,
    to: &str,
    units: u32,
    dice: &mut dyn DiceRoller,
) -> BattleLogEntry {
    let committed = state
        .node_mut(from)
        .map(|node| node.remove_units(units))
        .unwrap_or_else(|| panic!("attack source {from} missing"));
    let (defender_owner, garrison) = state
        .node(to)
        .map(|node| (node.owner, node.stack()))
        .unwrap_or_else(|| panic!("attack target {to} missing"));

    let outcome = resolve_combat(
        committed,
        garrison,
        defender_owner == Owner::Neutral,
        state.rules.evolved_combat_bonus,
        dice,
    );
    let attacker_losses = outcome.attacker_losses(committed);
    let defender_losses = outcome.defender_losses(garrison);

    let mut returned = Stack::default();
    if let Some(target) = state.node_mut(to) {
        target.standard_units = 0;
        target.evolved_units = 0;
        if outcome.captured {
            let mut survivors = outcome.attacker;
            let placed = survivors.take(target.max_units);
            target.owner = Owner::from(attacker);
            target.add_units(placed);
            target.deactivate_hub();
            returned = survivors;
        } else {
            target.add_units(outcome.defender);
        }
    }
    if returned.total() > 0 {
        if let Some(source) = state.node_mut(from) {
            source.add_units(returned);
        }
    }

    let turn = state.turn;
    {
        let faction = state.faction_mut(attacker);
        faction.units_lost += attacker_losses;
        if outcome.captured {
            faction.successful_attacks += 1;
        } else {
            faction.attacks_lost += 1;
        }
    }
    if let Some(defender) = defender_owner.faction() {
        let faction = state.faction_mut(defender);
        faction.units_lost += defender_losses;
        if outcome.captured {
            faction.defenses_lost += 1;
        } else {
            faction.successful_defenses += 1;
        }
    }

    let verdict = if outcome.captured { "captured" } else { "repelled" };
    state.log(
        LogLevel::Info,
        format!(
            "{attacker} attacked {to} ({defender_owner}) from {from} with {}: {verdict} after {} rounds, losses {attacker_losses}/{defender_losses}",
            committed.total(),
            outcome.rounds.len()
        ),
    );
    if returned.total() > 0 {
        state.log(
            LogLevel::Warning,
            format!("{} survivors returned to {from}: {to} is full", returned.total()),
        );
    }

    let entry = BattleLogEntry {
        turn,
        attacker,
        defender: defender_owner,
        from_node_id: from.to_string(),
        to_node_id: to.to_string(),
        attacking_units: committed,
        defending_units: garrison,
        rounds: outcome.rounds,
        attacker_losses,
        defender_losses,
        captured: outcome.captured,
        returned_to_source: returned.total(),
    };
    state.record_battle(entry.clone());
    entry
}
