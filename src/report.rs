//! Structured text summaries of a game.
//!
//! Meant to be read by people and by agents alike: fixed section headers,
//! one fact per line.

#![allow(clippy::format_push_string)]

use crate::game::{graph, FactionId, GameState, LogLevel, Owner};

/// How many trailing log entries the summary shows.
const RECENT_LOG_LINES: usize = 10;

/// Render a game state as sectioned text.
///
/// ```text
/// === TURN 7 OF 30 (COMBAT) ===
///
/// MAP: skirmish, 10 nodes, fog of war off
/// Knowledge junctions: 3 (2 connected needed for 3 turns)
///
/// FactionA STATUS:
/// - QR: 35
/// ...
/// ```
#[must_use]
pub fn render_summary(state: &GameState) -> String {
    let mut output = String::new();

    render_header(&mut output, state);
    render_map_overview(&mut output, state);
    for id in FactionId::ALL {
        render_faction_status(&mut output, state, id);
    }
    render_recent_battles(&mut output, state);
    render_recent_log(&mut output, state);
    render_game_status(&mut output, state);

    output
}

fn render_header(output: &mut String, state: &GameState) {
    output.push_str(&format!(
        "=== TURN {} OF {} ({}) ===\n\n",
        state.turn, state.max_turns, state.current_phase
    ));
}

fn render_map_overview(output: &mut String, state: &GameState) {
    let fog = if state.is_fog_of_war_active { "on" } else { "off" };
    output.push_str(&format!(
        "MAP: {}, {} nodes, fog of war {fog}\n",
        state.map_type,
        state.nodes.len()
    ));

    let junctions: Vec<_> = state
        .nodes
        .values()
        .filter(|node| node.is_knowledge_junction)
        .collect();
    output.push_str(&format!(
        "Knowledge junctions: {} ({} connected needed for {} turns)\n",
        junctions.len(),
        state.victory.required_kjs,
        state.victory.streak_target
    ));
    for node in junctions {
        output.push_str(&format!("- {} ({}): {}\n", node.id, node.region_name, node.owner));
    }

    let neutral = state
        .nodes
        .values()
        .filter(|node| node.owner == Owner::Neutral)
        .count();
    output.push_str(&format!("Neutral nodes: {neutral}\n\n"));
}

fn render_faction_status(output: &mut String, state: &GameState, id: FactionId) {
    let faction = state.faction(id);
    output.push_str(&format!("{id} STATUS:\n"));
    output.push_str(&format!("- QR: {}\n", faction.qr));
    output.push_str(&format!(
        "- Nodes: {} | Units: {} standard, {} evolved\n",
        faction.nodes_controlled, faction.total_standard_units, faction.total_evolved_units
    ));
    output.push_str(&format!(
        "- Connected KJs: {} (streak {}) | Active hubs: {}\n",
        faction.kjs_held, faction.kj_streak, faction.active_hubs_count
    ));
    output.push_str(&format!(
        "- Attacks won/lost: {}/{} | Defenses won/lost: {}/{} | Units lost: {}\n",
        faction.successful_attacks,
        faction.attacks_lost,
        faction.successful_defenses,
        faction.defenses_lost,
        faction.units_lost
    ));
    output.push_str(&format!(
        "- Sub-turns accepted/forfeited: {}/{}\n",
        faction.successful_turn_attempts, faction.failed_turn_attempts
    ));

    let cut_off: Vec<&str> = graph::owned_by(&state.nodes, id)
        .filter(|node| !graph::is_connected_to_command_node(&node.id, id, &state.nodes))
        .map(|node| node.id.as_str())
        .collect();
    if !cut_off.is_empty() {
        output.push_str(&format!("- Cut off from command: {}\n", cut_off.join(", ")));
    }
    if let Some(error) = &faction.last_error {
        output.push_str(&format!("- Last rejection: {error}\n"));
    }
    if let Some(analysis) = faction.tactical_analysis_history.last() {
        output.push_str(&format!(
            "- Latest analysis (turn {} {}): {}\n",
            analysis.turn, analysis.phase, analysis.text
        ));
    }
    output.push('\n');
}

fn render_recent_battles(output: &mut String, state: &GameState) {
    if state.battle_log.is_empty() {
        return;
    }
    output.push_str("RECENT BATTLES:\n");
    let skip = state.battle_log.len().saturating_sub(RECENT_LOG_LINES);
    for battle in state.battle_log.iter().skip(skip) {
        let result = if battle.captured { "captured" } else { "repelled" };
        output.push_str(&format!(
            "- T{} {} {} -> {} ({}): {} vs {}, losses {}/{}, {result}\n",
            battle.turn,
            battle.attacker,
            battle.from_node_id,
            battle.to_node_id,
            battle.defender,
            battle.attacking_units.total(),
            battle.defending_units.total(),
            battle.attacker_losses,
            battle.defender_losses,
        ));
    }
    output.push('\n');
}

fn render_recent_log(output: &mut String, state: &GameState) {
    if state.system_log.is_empty() {
        return;
    }
    output.push_str("RECENT LOG:\n");
    let skip = state.system_log.len().saturating_sub(RECENT_LOG_LINES);
    for entry in state.system_log.iter().skip(skip) {
        let tag = match entry.level {
            LogLevel::Info => "info",
            LogLevel::Event => "event",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        };
        output.push_str(&format!(
            "- T{} {} [{tag}] {}\n",
            entry.turn, entry.phase, entry.message
        ));
    }
    output.push('\n');
}

fn render_game_status(output: &mut String, state: &GameState) {
    output.push_str("GAME STATUS:\n");
    match (state.winner, state.win_condition) {
        (Some(winner), Some(condition)) => {
            output.push_str(&format!("- Finished: {winner} by {condition}\n"));
        }
        (Some(winner), None) => output.push_str(&format!("- Finished: {winner}\n")),
        (None, _) if state.is_paused => output.push_str("- Paused\n"),
        (None, _) => output.push_str(&format!(
            "- In progress, {} to act next\n",
            state.active_player
        )),
    }
    for id in FactionId::ALL {
        output.push_str(&format!("- {id} score: {}\n", state.faction(id).score()));
    }
}
