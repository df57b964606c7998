//! Game layer for Noosphere.
//!
//! Implements the rules of a turn:
//! - Node graph with ownership, garrisons and fabrication hubs
//! - Supply lines (connectivity to a command node)
//! - Action validation and application
//! - Dice combat
//! - Fluctuation events, resource income and win conditions
//! - Fog-of-war views for agents

mod action;
mod apply;
mod combat;
mod economy;
mod faction;
pub mod graph;
mod invariants;
mod node;
mod state;
mod validate;
mod victory;
mod visibility;

pub mod fluctuation;

pub use action::{parse_response, strip_code_fence, Action, ActionKind, AgentResponse};
pub use apply::{apply_action, Applied};
pub use combat::{
    process_attack, resolve_combat, BattleLogEntry, CombatOutcome, DiceRollDetail, DiceRoller,
    ScriptedDice,
};
pub use economy::{collect_resources, Income};
pub use faction::{Faction, TacticalAnalysis};
pub use graph::{is_connected_to_command_node, NodeMap};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use node::{FactionId, Node, NodeId, Owner, Stack};
pub use state::{Factions, GameState, LogEntry, LogLevel, Phase, WinCondition, Winner};
pub use validate::validate_action;
pub use victory::{evaluate_turn_end, is_eliminated, VictoryRules};
pub use visibility::{visible_state, AgentRequest};
