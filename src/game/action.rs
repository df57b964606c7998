//! Agent actions and response parsing.
//!
//! Agents answer with JSON of the form
//!
//! ```json
//! {
//!   "actions": [
//!     { "type": "DEPLOY_UNITS", "nodeId": "a-nexus", "units": 2 },
//!     { "type": "MOVE_UNITS", "fromNodeId": "a-nexus", "toNodeId": "a-relay-n", "units": 3 }
//!   ],
//!   "tacticalAnalysis": "Reinforcing the northern relay."
//! }
//! ```
//!
//! Each action kind only accepts its own fields, and a missing field is a
//! parse error rather than a runtime surprise during validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResponseError;
use crate::game::{NodeId, Phase};

/// One proposed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Buy standard units at an owned command node.
    #[serde(rename_all = "camelCase")]
    DeployUnits {
        /// Target command node.
        node_id: NodeId,
        /// Units to buy.
        units: u32,
    },
    /// Move units into an owned or neutral neighbour.
    #[serde(rename_all = "camelCase")]
    MoveUnits {
        /// Source node.
        from_node_id: NodeId,
        /// Destination node.
        to_node_id: NodeId,
        /// Units to move.
        units: u32,
    },
    /// Attack a neighbour not owned by the acting faction.
    #[serde(rename_all = "camelCase")]
    AttackNode {
        /// Source node.
        from_node_id: NodeId,
        /// Target node.
        to_node_id: NodeId,
        /// Units committed.
        units: u32,
    },
    /// Switch on a fabrication hub.
    #[serde(rename_all = "camelCase")]
    ActivateFabricationHub {
        /// Hub node.
        node_id: NodeId,
    },
    /// Convert standard units to evolved units at an active hub.
    #[serde(rename_all = "camelCase")]
    EvolveUnits {
        /// Hub node.
        node_id: NodeId,
        /// Standard units to convert.
        units_to_evolve: u32,
    },
}

/// Action discriminant, used in error messages and phase checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `DEPLOY_UNITS`
    Deploy,
    /// `MOVE_UNITS`
    Move,
    /// `ATTACK_NODE`
    Attack,
    /// `ACTIVATE_FABRICATION_HUB`
    ActivateHub,
    /// `EVOLVE_UNITS`
    Evolve,
}

impl ActionKind {
    /// Whether this kind may be submitted during `phase`.
    #[must_use]
    pub const fn allowed_in(self, phase: Phase) -> bool {
        match phase {
            Phase::Maneuver => !matches!(self, ActionKind::Attack),
            Phase::Combat => matches!(self, ActionKind::Attack),
            Phase::Fluctuation | Phase::Resource | Phase::GameOver => false,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Deploy => "DEPLOY_UNITS",
            ActionKind::Move => "MOVE_UNITS",
            ActionKind::Attack => "ATTACK_NODE",
            ActionKind::ActivateHub => "ACTIVATE_FABRICATION_HUB",
            ActionKind::Evolve => "EVOLVE_UNITS",
        };
        f.write_str(name)
    }
}

impl Action {
    /// The action's kind.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::DeployUnits { .. } => ActionKind::Deploy,
            Action::MoveUnits { .. } => ActionKind::Move,
            Action::AttackNode { .. } => ActionKind::Attack,
            Action::ActivateFabricationHub { .. } => ActionKind::ActivateHub,
            Action::EvolveUnits { .. } => ActionKind::Evolve,
        }
    }

    /// Every node id the action references.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        match self {
            Action::DeployUnits { node_id, .. }
            | Action::ActivateFabricationHub { node_id }
            | Action::EvolveUnits { node_id, .. } => vec![node_id.as_str()],
            Action::MoveUnits {
                from_node_id,
                to_node_id,
                ..
            }
            | Action::AttackNode {
                from_node_id,
                to_node_id,
                ..
            } => vec![from_node_id.as_str(), to_node_id.as_str()],
        }
    }

    /// Unit count carried by the action, if the kind has one.
    #[must_use]
    pub const fn unit_count(&self) -> Option<u32> {
        match self {
            Action::DeployUnits { units, .. }
            | Action::MoveUnits { units, .. }
            | Action::AttackNode { units, .. } => Some(*units),
            Action::EvolveUnits {
                units_to_evolve, ..
            } => Some(*units_to_evolve),
            Action::ActivateFabricationHub { .. } => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::DeployUnits { node_id, units } => write!(f, "deploy {units} at {node_id}"),
            Action::MoveUnits {
                from_node_id,
                to_node_id,
                units,
            } => write!(f, "move {units} {from_node_id} -> {to_node_id}"),
            Action::AttackNode {
                from_node_id,
                to_node_id,
                units,
            } => write!(f, "attack {to_node_id} from {from_node_id} with {units}"),
            Action::ActivateFabricationHub { node_id } => write!(f, "activate hub at {node_id}"),
            Action::EvolveUnits {
                node_id,
                units_to_evolve,
            } => write!(f, "evolve {units_to_evolve} at {node_id}"),
        }
    }
}

/// A parsed agent response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    /// Actions in submission order.
    pub actions: Vec<Action>,
    /// Free-text commentary.
    pub tactical_analysis: String,
}

/// Strip an optional Markdown code fence around a response body.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a raw agent reply.
///
/// # Errors
///
/// Returns [`ResponseError::Empty`] for a blank reply and
/// [`ResponseError::Schema`] when the JSON does not match the response shape.
pub fn parse_response(raw: &str) -> Result<AgentResponse, ResponseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ResponseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}
