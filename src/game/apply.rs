//! Action application.
//!
//! Every function here assumes [`validate_action`](crate::game::validate_action)
//! accepted the action against the same state, and panics otherwise.

use crate::game::{
    process_attack, Action, BattleLogEntry, DiceRoller, FactionId, GameState, LogLevel, Owner,
    Stack,
};

/// What applying an action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A non-combat action took effect.
    Done,
    /// A move moved fewer units than requested; the rest stayed at the source.
    Capped {
        /// Units that actually moved.
        moved: u32,
        /// Units left behind.
        left_behind: u32,
    },
    /// An attack was fought.
    Battle(Box<BattleLogEntry>),
}

/// Apply a validated action for `faction`.
///
/// # Panics
///
/// Panics if the action would break a state invariant, which means it was
/// not validated against this state.
pub fn apply_action(
    state: &mut GameState,
    faction: FactionId,
    action: &Action,
    dice: &mut dyn DiceRoller,
) -> Applied {
    match action {
        Action::DeployUnits { node_id, units } => {
            let cost = u64::from(*units) * u64::from(state.rules.deploy_unit_cost);
            state.faction_mut(faction).debit(cost);
            state.faction_mut(faction).units_purchased += units;
            if let Some(node) = state.node_mut(node_id) {
                node.add_units(Stack::new(*units, 0));
            }
            state.log(
                LogLevel::Info,
                format!("{faction} deployed {units} units at {node_id}"),
            );
            Applied::Done
        }
        Action::MoveUnits {
            from_node_id,
            to_node_id,
            units,
        } => apply_move(state, faction, from_node_id, to_node_id, *units),
        Action::AttackNode {
            from_node_id,
            to_node_id,
            units,
        } => Applied::Battle(Box::new(process_attack(
            state,
            faction,
            from_node_id,
            to_node_id,
            *units,
            dice,
        ))),
        Action::ActivateFabricationHub { node_id } => {
            let cost = u64::from(state.rules.hub_activation_cost);
            state.faction_mut(faction).debit(cost);
            if let Some(node) = state.node_mut(node_id) {
                assert!(node.has_fabrication_hub, "node {node_id} has no hub");
                node.is_hub_active = true;
                node.hub_disconnected_turn = None;
            }
            state.log(
                LogLevel::Info,
                format!("{faction} activated the fabrication hub at {node_id}"),
            );
            Applied::Done
        }
        Action::EvolveUnits {
            node_id,
            units_to_evolve,
        } => {
            let cost = u64::from(*units_to_evolve) * u64::from(state.rules.evolve_unit_cost);
            state.faction_mut(faction).debit(cost);
            if let Some(node) = state.node_mut(node_id) {
                assert!(
                    node.standard_units >= *units_to_evolve,
                    "node {node_id} cannot evolve {units_to_evolve} of {} standard units",
                    node.standard_units
                );
                node.standard_units -= units_to_evolve;
                node.evolved_units += units_to_evolve;
            }
            state.log(
                LogLevel::Info,
                format!("{faction} evolved {units_to_evolve} units at {node_id}"),
            );
            Applied::Done
        }
    }
}

fn apply_move(
    state: &mut GameState,
    faction: FactionId,
    from: &str,
    to: &str,
    units: u32,
) -> Applied {
    let free = state.node(to).map_or(0, |node| node.free_capacity());
    let moving = units.min(free);
    let stack = state
        .node_mut(from)
        .map(|node| node.remove_units(moving))
        .unwrap_or_default();
    if let Some(destination) = state.node_mut(to) {
        if destination.owner == Owner::Neutral {
            destination.owner = Owner::from(faction);
        }
        destination.add_units(stack);
    }

    if moving < units {
        let left_behind = units - moving;
        state.log(
            LogLevel::Warning,
            format!("{faction} move {from} -> {to} capped: {moving} moved, {left_behind} stayed"),
        );
        Applied::Capped {
            moved: moving,
            left_behind,
        }
    } else {
        state.log(
            LogLevel::Info,
            format!("{faction} moved {units} units {from} -> {to}"),
        );
        Applied::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::graph::link;
    use crate::game::{Node, NodeMap, Phase, ScriptedDice, VictoryRules};
    use crate::maps::MapType;

    fn create_test_game() -> GameState {
        let mut nodes = NodeMap::new();
        for node in [
            Node::new("cn", "Command", 20)
                .owned_by(FactionId::FactionA)
                .command_node()
                .with_units(6, 2),
            Node::new("hub", "Hub", 10)
                .owned_by(FactionId::FactionA)
                .with_hub()
                .with_units(5, 0),
            Node::new("outpost", "Outpost", 3),
        ] {
            nodes.insert(node.id.clone(), node);
        }
        link(&mut nodes, "cn", "hub");
        link(&mut nodes, "cn", "outpost");
        let mut state = GameState::new(
            nodes,
            MapType::Skirmish,
            false,
            VictoryRules::new(1, 3),
            &EngineConfig::default(),
            3,
        );
        state.current_phase = Phase::Maneuver;
        state
    }

    #[test]
    fn test_deploy_debits_and_adds() {
        let mut state = create_test_game();
        let mut dice = ScriptedDice::attacker_favoured();
        let action = Action::DeployUnits {
            node_id: "cn".into(),
            units: 3,
        };
        assert_eq!(apply_action(&mut state, FactionId::FactionA, &action, &mut dice), Applied::Done);
        assert_eq!(state.faction(FactionId::FactionA).qr, 20);
        assert_eq!(state.faction(FactionId::FactionA).units_purchased, 3);
        assert_eq!(state.node("cn").unwrap().standard_units, 9);
    }

    #[test]
    fn test_move_into_neutral_takes_ownership_and_caps() {
        let mut state = create_test_game();
        let mut dice = ScriptedDice::attacker_favoured();
        let action = Action::MoveUnits {
            from_node_id: "cn".into(),
            to_node_id: "outpost".into(),
            units: 7,
        };
        let applied = apply_action(&mut state, FactionId::FactionA, &action, &mut dice);
        assert_eq!(
            applied,
            Applied::Capped {
                moved: 3,
                left_behind: 4
            }
        );
        let outpost = state.node("outpost").unwrap();
        assert_eq!(outpost.owner, Owner::FactionA);
        assert_eq!(outpost.stack(), Stack::new(3, 0));
        assert_eq!(state.node("cn").unwrap().stack(), Stack::new(3, 2));
    }

    #[test]
    fn test_move_standard_first() {
        let mut state = create_test_game();
        let mut dice = ScriptedDice::attacker_favoured();
        let action = Action::MoveUnits {
            from_node_id: "cn".into(),
            to_node_id: "hub".into(),
            units: 5,
        };
        apply_action(&mut state, FactionId::FactionA, &action, &mut dice);
        assert_eq!(state.node("hub").unwrap().stack(), Stack::new(10, 0));
        assert_eq!(state.node("cn").unwrap().stack(), Stack::new(1, 2));
    }

    #[test]
    fn test_activate_then_evolve() {
        let mut state = create_test_game();
        state.faction_mut(FactionId::FactionA).qr = 100;
        let mut dice = ScriptedDice::attacker_favoured();
        apply_action(
            &mut state,
            FactionId::FactionA,
            &Action::ActivateFabricationHub {
                node_id: "hub".into(),
            },
            &mut dice,
        );
        apply_action(
            &mut state,
            FactionId::FactionA,
            &Action::EvolveUnits {
                node_id: "hub".into(),
                units_to_evolve: 2,
            },
            &mut dice,
        );
        let hub = state.node("hub").unwrap();
        assert!(hub.is_hub_active);
        assert_eq!(hub.stack(), Stack::new(3, 2));
        assert_eq!(state.faction(FactionId::FactionA).qr, 100 - 40 - 30);
    }
}
