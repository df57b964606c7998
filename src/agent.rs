//! Agent gateways: the request/response boundary to the strategy agents.
//!
//! The engine hands each gateway a rendered prompt and expects raw text
//! back. Parsing, validation and retries happen in the engine, so a gateway
//! only has to move bytes.

mod command;
mod scripted;

pub use command::CommandAgent;
pub use scripted::ScriptedAgent;

use crate::config::RuleSet;
use crate::error::GatewayError;
use crate::game::{AgentRequest, FactionId, Phase};

/// Something that answers prompts for one faction.
pub trait AgentGateway: Send {
    /// Send a prompt and wait for the raw reply.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on timeout or transport failure.
    fn complete(&mut self, faction: FactionId, prompt: &str) -> Result<String, GatewayError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Prefix of the feedback line added to retried prompts.
pub const REJECTION_PREFIX: &str = "PREVIOUS ATTEMPT REJECTED:";

fn phase_brief(phase: Phase, rules: &RuleSet) -> String {
    match phase {
        Phase::Maneuver => format!(
            "MANEUVER phase. Allowed actions:\n\
             - DEPLOY_UNITS {{nodeId, units}}: buy standard units at your command node, {} QR each.\n\
             - MOVE_UNITS {{fromNodeId, toNodeId, units}}: move along an edge into an owned or neutral node.\n\
             - ACTIVATE_FABRICATION_HUB {{nodeId}}: {} QR, needs a garrison of {} and a supply line.\n\
             - EVOLVE_UNITS {{nodeId, unitsToEvolve}}: {} QR per unit at an active, supplied hub.",
            rules.deploy_unit_cost,
            rules.hub_activation_cost,
            rules.hub_min_garrison,
            rules.evolve_unit_cost,
        ),
        Phase::Combat => format!(
            "COMBAT phase. Allowed actions:\n\
             - ATTACK_NODE {{fromNodeId, toNodeId, units}}: attack an adjacent node you do not own.\n\
             Stacks holding an evolved unit add {} to every die roll.",
            rules.evolved_combat_bonus
        ),
        Phase::Fluctuation | Phase::Resource | Phase::GameOver => {
            format!("{phase} phase. No actions are accepted.")
        }
    }
}

/// Render the prompt for one attempt.
///
/// Retries carry the previous rejection reason on the first line.
///
/// # Errors
///
/// Returns an error if the request cannot be serialized.
pub fn render_prompt(
    request: &AgentRequest,
    rules: &RuleSet,
    feedback: Option<&str>,
) -> Result<String, serde_json::Error> {
    let mut prompt = String::new();
    if let Some(reason) = feedback {
        prompt.push_str(REJECTION_PREFIX);
        prompt.push(' ');
        prompt.push_str(reason);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!(
        "You command {} on turn {}.\n{}\n\n",
        request.your_faction_id,
        request.turn,
        phase_brief(request.current_phase, rules)
    ));
    prompt.push_str(
        "Reply with JSON only: {\"actions\": [...], \"tacticalAnalysis\": \"...\"}. \
         Actions run in order; if any is invalid the whole batch is rejected.\n\n",
    );
    prompt.push_str("GAME STATE:\n");
    prompt.push_str(&serde_json::to_string_pretty(request)?);
    prompt.push('\n');
    Ok(prompt)
}
