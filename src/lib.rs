// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Noosphere: a turn engine for two-faction territorial conquest.
//!
//! Two factions fight over a graph of nodes. Each turn runs a fixed cycle of
//! phases; in the maneuver and combat phases each faction's moves come from
//! an external agent, which answers a JSON prompt with a batch of actions.
//! The engine validates every batch against the rules, retries with feedback
//! when a batch is rejected, and applies accepted batches atomically.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Session / Batch runner / CLI      │
//! ├─────────────────────────────────────┤
//! │   Engine (phases, retry protocol)   │
//! ├──────────────────┬──────────────────┤
//! │   Game rules     │  Agent gateways  │
//! └──────────────────┴──────────────────┘
//! ```

pub mod agent;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod maps;
pub mod persistence;
pub mod report;

pub use config::{EngineConfig, RuleSet};
pub use engine::{Engine, Intent, PauseHandle, Session, StepOutcome};
pub use error::{GatewayError, PersistenceError, RuleViolation, TurnError};

// Re-export key game types at crate root for convenience
pub use game::{
    Action, Faction, FactionId, GameState, Node, NodeId, Owner, Phase, WinCondition, Winner,
};
pub use maps::{build_game, MapType};
