//! Agent request payloads and the fog-of-war filter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::game::{Faction, FactionId, GameState, Node, Owner, Phase};
use crate::maps::MapType;

/// The state one faction's agent sees for a sub-turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Current turn.
    pub turn: u32,
    /// Phase being played.
    pub current_phase: Phase,
    /// Faction the agent plays.
    pub your_faction_id: FactionId,
    /// Visible nodes.
    pub map_nodes: Vec<Node>,
    /// Map template.
    pub map_type: MapType,
    /// Whether the view is filtered.
    pub is_fog_of_war_active: bool,
    /// Both factions, the opponent redacted under fog.
    pub factions: Vec<Faction>,
}

/// Build `viewer`'s view of the state.
///
/// Without fog the full state is shared. With fog, owned nodes are shown in
/// full. Nodes adjacent to an owned node appear with an `Unknown` owner, no
/// garrison or hub data, and links only to shown nodes. Every other node is
/// left out. The opponent's faction record keeps only its loss counters.
#[must_use]
pub fn visible_state(state: &GameState, viewer: FactionId) -> AgentRequest {
    let (map_nodes, factions) = if state.is_fog_of_war_active {
        (fogged_nodes(state, viewer), fogged_factions(state, viewer))
    } else {
        (
            state.nodes.values().cloned().collect(),
            state.factions.iter().cloned().collect(),
        )
    };
    AgentRequest {
        turn: state.turn,
        current_phase: state.current_phase,
        your_faction_id: viewer,
        map_nodes,
        map_type: state.map_type,
        is_fog_of_war_active: state.is_fog_of_war_active,
        factions,
    }
}

fn fogged_nodes(state: &GameState, viewer: FactionId) -> Vec<Node> {
    let borders = |node: &Node| {
        node.connections.iter().any(|id| {
            state
                .node(id)
                .is_some_and(|neighbour| neighbour.owner.is(viewer))
        })
    };
    let shown: BTreeSet<&str> = state
        .nodes
        .values()
        .filter(|&node| node.owner.is(viewer) || borders(node))
        .map(|node| node.id.as_str())
        .collect();

    let mut visible = Vec::new();
    for node in state.nodes.values() {
        if node.owner.is(viewer) {
            visible.push(node.clone());
        } else if shown.contains(node.id.as_str()) {
            let mut masked = node.clone();
            masked.owner = Owner::Unknown;
            masked.standard_units = 0;
            masked.evolved_units = 0;
            masked.has_fabrication_hub = false;
            masked.deactivate_hub();
            masked.connections.retain(|id| shown.contains(id.as_str()));
            visible.push(masked);
        }
    }
    visible
}

fn fogged_factions(state: &GameState, viewer: FactionId) -> Vec<Faction> {
    state
        .factions
        .iter()
        .map(|faction| {
            if faction.id == viewer {
                return faction.clone();
            }
            let mut redacted = Faction::new(faction.id, 0);
            redacted.units_lost = faction.units_lost;
            redacted.attacks_lost = faction.attacks_lost;
            redacted.defenses_lost = faction.defenses_lost;
            redacted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::graph::link;
    use crate::game::{NodeMap, VictoryRules};

    /// acn - border - far - bcn
    fn create_test_game(fog: bool) -> GameState {
        let mut nodes = NodeMap::new();
        for node in [
            Node::new("acn", "A", 20)
                .owned_by(FactionId::FactionA)
                .command_node()
                .with_units(5, 1),
            Node::new("border", "Border", 20)
                .owned_by(FactionId::FactionB)
                .with_hub()
                .with_units(4, 2),
            Node::new("far", "Far", 20)
                .owned_by(FactionId::FactionB)
                .with_units(7, 0),
            Node::new("bcn", "B", 20)
                .owned_by(FactionId::FactionB)
                .command_node()
                .with_units(9, 0),
        ] {
            nodes.insert(node.id.clone(), node);
        }
        link(&mut nodes, "acn", "border");
        link(&mut nodes, "border", "far");
        link(&mut nodes, "far", "bcn");
        let mut state = GameState::new(
            nodes,
            MapType::Skirmish,
            fog,
            VictoryRules::new(1, 3),
            &EngineConfig::default(),
            0,
        );
        if let Some(border) = state.node_mut("border") {
            border.is_hub_active = true;
        }
        state.faction_mut(FactionId::FactionB).units_lost = 3;
        state.faction_mut(FactionId::FactionB).successful_attacks = 2;
        state
    }

    #[test]
    fn test_no_fog_shares_everything() {
        let state = create_test_game(false);
        let view = visible_state(&state, FactionId::FactionA);
        assert_eq!(view.map_nodes.len(), 4);
        assert_eq!(view.factions[1], *state.faction(FactionId::FactionB));
    }

    #[test]
    fn test_fog_masks_border_and_hides_far_nodes() {
        let state = create_test_game(true);
        let view = visible_state(&state, FactionId::FactionA);
        let ids: Vec<&str> = view.map_nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["acn", "border"]);

        let border = &view.map_nodes[1];
        assert_eq!(border.owner, Owner::Unknown);
        assert_eq!(border.total_units(), 0);
        assert!(!border.is_hub_active);
        assert!(!border.has_fabrication_hub);

        let own = &view.map_nodes[0];
        assert_eq!(own.stack(), state.node("acn").unwrap().stack());
    }

    #[test]
    fn test_fog_drops_links_to_hidden_nodes() {
        let state = create_test_game(true);
        let view = visible_state(&state, FactionId::FactionA);
        let border = &view.map_nodes[1];
        assert_eq!(border.id, "border");
        assert!(state.node("border").unwrap().connections.contains("far"));
        assert_eq!(border.connections.iter().collect::<Vec<_>>(), vec!["acn"]);
        assert!(view
            .map_nodes
            .iter()
            .flat_map(|node| &node.connections)
            .all(|id| view.map_nodes.iter().any(|node| &node.id == id)));
    }

    #[test]
    fn test_fog_redacts_opponent_except_losses() {
        let state = create_test_game(true);
        let view = visible_state(&state, FactionId::FactionA);
        let opponent = &view.factions[1];
        assert_eq!(opponent.id, FactionId::FactionB);
        assert_eq!(opponent.qr, 0);
        assert_eq!(opponent.nodes_controlled, 0);
        assert_eq!(opponent.successful_attacks, 0);
        assert_eq!(opponent.units_lost, 3);
        assert_eq!(view.factions[0], *state.faction(FactionId::FactionA));
    }
}
