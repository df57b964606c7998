//! Action validation.
//!
//! Validation never mutates. The engine validates each action against the
//! state left by every earlier action of the same batch, so a deploy
//! followed by a hub activation at the same node sees the deployed units.

use crate::error::RuleViolation;
use crate::game::{graph, Action, FactionId, GameState, Node};

/// Check one action for `faction` against the current state and phase.
///
/// # Errors
///
/// Returns the first rule the action breaks.
pub fn validate_action(
    state: &GameState,
    faction: FactionId,
    action: &Action,
) -> Result<(), RuleViolation> {
    let kind = action.kind();
    for node_id in action.node_ids() {
        if state.node(node_id).is_none() {
            return Err(RuleViolation::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
    }
    if action.unit_count() == Some(0) {
        return Err(RuleViolation::ZeroUnits { action: kind });
    }
    if !kind.allowed_in(state.current_phase) {
        return Err(RuleViolation::PhaseForbids {
            action: kind,
            phase: state.current_phase,
        });
    }

    match action {
        Action::DeployUnits { node_id, units } => validate_deploy(state, faction, node_id, *units),
        Action::MoveUnits {
            from_node_id,
            to_node_id,
            units,
        } => validate_move(state, faction, from_node_id, to_node_id, *units),
        Action::AttackNode {
            from_node_id,
            to_node_id,
            units,
        } => validate_attack(state, faction, from_node_id, to_node_id, *units),
        Action::ActivateFabricationHub { node_id } => {
            validate_hub_activation(state, faction, node_id)
        }
        Action::EvolveUnits {
            node_id,
            units_to_evolve,
        } => validate_evolve(state, faction, node_id, *units_to_evolve),
    }
}

fn lookup<'a>(state: &'a GameState, node_id: &str) -> Result<&'a Node, RuleViolation> {
    state.node(node_id).ok_or_else(|| RuleViolation::UnknownNode {
        node_id: node_id.to_string(),
    })
}

fn owned<'a>(
    state: &'a GameState,
    faction: FactionId,
    node_id: &str,
) -> Result<&'a Node, RuleViolation> {
    let node = lookup(state, node_id)?;
    if node.owner.is(faction) {
        Ok(node)
    } else {
        Err(RuleViolation::NotOwned {
            node_id: node_id.to_string(),
        })
    }
}

fn afford(state: &GameState, faction: FactionId, needed: u64) -> Result<(), RuleViolation> {
    let available = state.faction(faction).qr;
    if u64::from(available) < needed {
        return Err(RuleViolation::InsufficientQr { needed, available });
    }
    Ok(())
}

fn connected(state: &GameState, faction: FactionId, node_id: &str) -> Result<(), RuleViolation> {
    if graph::is_connected_to_command_node(node_id, faction, &state.nodes) {
        Ok(())
    } else {
        Err(RuleViolation::Disconnected {
            node_id: node_id.to_string(),
        })
    }
}

/// Shared source/edge checks for moves and attacks.
fn check_source(
    state: &GameState,
    faction: FactionId,
    from: &str,
    to: &str,
    units: u32,
) -> Result<(), RuleViolation> {
    let source = owned(state, faction, from)?;
    if source.total_units() < units {
        return Err(RuleViolation::InsufficientUnits {
            node_id: from.to_string(),
            requested: units,
            available: source.total_units(),
        });
    }
    if !source.is_adjacent_to(to) {
        return Err(RuleViolation::NotAdjacent {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

fn validate_deploy(
    state: &GameState,
    faction: FactionId,
    node_id: &str,
    units: u32,
) -> Result<(), RuleViolation> {
    let node = owned(state, faction, node_id)?;
    if !node.is_command_node {
        return Err(RuleViolation::NotCommandNode {
            node_id: node_id.to_string(),
        });
    }
    afford(
        state,
        faction,
        u64::from(units) * u64::from(state.rules.deploy_unit_cost),
    )?;
    if units > node.free_capacity() {
        return Err(RuleViolation::CapacityExceeded {
            node_id: node_id.to_string(),
            requested: units,
            free: node.free_capacity(),
        });
    }
    Ok(())
}

fn validate_move(
    state: &GameState,
    faction: FactionId,
    from: &str,
    to: &str,
    units: u32,
) -> Result<(), RuleViolation> {
    check_source(state, faction, from, to, units)?;
    let destination = lookup(state, to)?;
    if destination.owner.faction().is_some_and(|owner| owner != faction) {
        return Err(RuleViolation::HostileDestination {
            node_id: to.to_string(),
        });
    }
    // A partial overflow is capped when applied; a full destination moves nothing.
    if destination.free_capacity() == 0 {
        return Err(RuleViolation::DestinationFull {
            node_id: to.to_string(),
        });
    }
    Ok(())
}

fn validate_attack(
    state: &GameState,
    faction: FactionId,
    from: &str,
    to: &str,
    units: u32,
) -> Result<(), RuleViolation> {
    check_source(state, faction, from, to, units)?;
    if lookup(state, to)?.owner.is(faction) {
        return Err(RuleViolation::FriendlyTarget {
            node_id: to.to_string(),
        });
    }
    Ok(())
}

fn validate_hub_activation(
    state: &GameState,
    faction: FactionId,
    node_id: &str,
) -> Result<(), RuleViolation> {
    let node = owned(state, faction, node_id)?;
    if !node.has_fabrication_hub {
        return Err(RuleViolation::NoFabricationHub {
            node_id: node_id.to_string(),
        });
    }
    if node.is_hub_active {
        return Err(RuleViolation::HubAlreadyActive {
            node_id: node_id.to_string(),
        });
    }
    afford(state, faction, u64::from(state.rules.hub_activation_cost))?;
    if node.total_units() < state.rules.hub_min_garrison {
        return Err(RuleViolation::GarrisonTooSmall {
            node_id: node_id.to_string(),
            required: state.rules.hub_min_garrison,
            present: node.total_units(),
        });
    }
    connected(state, faction, node_id)
}

fn validate_evolve(
    state: &GameState,
    faction: FactionId,
    node_id: &str,
    units: u32,
) -> Result<(), RuleViolation> {
    let node = owned(state, faction, node_id)?;
    if !node.is_hub_active {
        return Err(RuleViolation::HubInactive {
            node_id: node_id.to_string(),
        });
    }
    afford(
        state,
        faction,
        u64::from(units) * u64::from(state.rules.evolve_unit_cost),
    )?;
    if node.standard_units < units {
        return Err(RuleViolation::InsufficientStandardUnits {
            node_id: node_id.to_string(),
            requested: units,
            available: node.standard_units,
        });
    }
    connected(state, faction, node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::graph::link;
    use crate::game::{NodeMap, Phase, VictoryRules};
    use crate::maps::MapType;

    /// cn(A, 10) - hub(A, 2, hub) - neutral(0) - enemy(B, 3) - bcn(B)
    fn create_test_game() -> GameState {
        let mut nodes = NodeMap::new();
        for node in [
            Node::new("cn", "Command", 20)
                .owned_by(FactionId::FactionA)
                .command_node()
                .with_units(10, 0),
            Node::new("hub", "Hub", 10)
                .owned_by(FactionId::FactionA)
                .knowledge_junction()
                .with_hub()
                .with_units(2, 0),
            Node::new("neutral", "Neutral", 4),
            Node::new("enemy", "Enemy", 10)
                .owned_by(FactionId::FactionB)
                .with_units(3, 0),
            Node::new("bcn", "Enemy Command", 20)
                .owned_by(FactionId::FactionB)
                .command_node()
                .with_units(5, 0),
        ] {
            nodes.insert(node.id.clone(), node);
        }
        link(&mut nodes, "cn", "hub");
        link(&mut nodes, "cn", "neutral");
        link(&mut nodes, "hub", "enemy");
        link(&mut nodes, "enemy", "bcn");
        let mut state = GameState::new(
            nodes,
            MapType::Skirmish,
            false,
            VictoryRules::new(1, 3),
            &EngineConfig::default(),
            1,
        );
        state.current_phase = Phase::Maneuver;
        state
    }

    fn deploy(node: &str, units: u32) -> Action {
        Action::DeployUnits {
            node_id: node.into(),
            units,
        }
    }

    #[test]
    fn test_deploy_valid() {
        let state = create_test_game();
        assert_eq!(validate_action(&state, FactionId::FactionA, &deploy("cn", 5)), Ok(()));
    }

    #[test]
    fn test_deploy_rules() {
        let state = create_test_game();
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("hub", 1)),
            Err(RuleViolation::NotCommandNode { .. })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("bcn", 1)),
            Err(RuleViolation::NotOwned { .. })
        ));
        assert_eq!(
            validate_action(&state, FactionId::FactionA, &deploy("cn", 6)),
            Err(RuleViolation::InsufficientQr {
                needed: 60,
                available: 50
            })
        );
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("cn", 0)),
            Err(RuleViolation::ZeroUnits { .. })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("nowhere", 1)),
            Err(RuleViolation::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_deploy_capacity() {
        let mut state = create_test_game();
        state.faction_mut(FactionId::FactionA).qr = 1000;
        assert_eq!(
            validate_action(&state, FactionId::FactionA, &deploy("cn", 11)),
            Err(RuleViolation::CapacityExceeded {
                node_id: "cn".into(),
                requested: 11,
                free: 10
            })
        );
    }

    #[test]
    fn test_phase_gate() {
        let mut state = create_test_game();
        state.current_phase = Phase::Combat;
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("cn", 1)),
            Err(RuleViolation::PhaseForbids { .. })
        ));
        state.current_phase = Phase::Resource;
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &deploy("cn", 1)),
            Err(RuleViolation::PhaseForbids { .. })
        ));
    }

    #[test]
    fn test_move_rules() {
        let state = create_test_game();
        let mv = |from: &str, to: &str, units| Action::MoveUnits {
            from_node_id: from.into(),
            to_node_id: to.into(),
            units,
        };
        assert_eq!(validate_action(&state, FactionId::FactionA, &mv("cn", "neutral", 3)), Ok(()));
        // Larger than the destination's free space is still valid; it is capped on apply.
        assert_eq!(validate_action(&state, FactionId::FactionA, &mv("cn", "neutral", 9)), Ok(()));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &mv("hub", "enemy", 1)),
            Err(RuleViolation::HostileDestination { .. })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &mv("cn", "enemy", 1)),
            Err(RuleViolation::NotAdjacent { .. })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &mv("hub", "cn", 3)),
            Err(RuleViolation::InsufficientUnits { .. })
        ));
    }

    #[test]
    fn test_move_into_full_node_rejected() {
        let mut state = create_test_game();
        if let Some(node) = state.node_mut("neutral") {
            node.standard_units = 4;
        }
        let action = Action::MoveUnits {
            from_node_id: "cn".into(),
            to_node_id: "neutral".into(),
            units: 1,
        };
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &action),
            Err(RuleViolation::DestinationFull { .. })
        ));
    }

    #[test]
    fn test_attack_rules() {
        let mut state = create_test_game();
        state.current_phase = Phase::Combat;
        let attack = |from: &str, to: &str, units| Action::AttackNode {
            from_node_id: from.into(),
            to_node_id: to.into(),
            units,
        };
        assert_eq!(validate_action(&state, FactionId::FactionA, &attack("hub", "enemy", 2)), Ok(()));
        assert_eq!(
            validate_action(&state, FactionId::FactionA, &attack("cn", "neutral", 2)),
            Ok(())
        );
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &attack("cn", "hub", 2)),
            Err(RuleViolation::FriendlyTarget { .. })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &attack("enemy", "hub", 1)),
            Err(RuleViolation::NotOwned { .. })
        ));
    }

    #[test]
    fn test_hub_activation_rules() {
        let mut state = create_test_game();
        let activate = |node: &str| Action::ActivateFabricationHub {
            node_id: node.into(),
        };
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &activate("hub")),
            Err(RuleViolation::GarrisonTooSmall {
                required: 5,
                present: 2,
                ..
            })
        ));
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &activate("cn")),
            Err(RuleViolation::NoFabricationHub { .. })
        ));

        if let Some(node) = state.node_mut("hub") {
            node.standard_units = 5;
        }
        assert_eq!(validate_action(&state, FactionId::FactionA, &activate("hub")), Ok(()));

        state.faction_mut(FactionId::FactionA).qr = 39;
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &activate("hub")),
            Err(RuleViolation::InsufficientQr { .. })
        ));

        state.faction_mut(FactionId::FactionA).qr = 40;
        if let Some(node) = state.node_mut("hub") {
            node.is_hub_active = true;
        }
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &activate("hub")),
            Err(RuleViolation::HubAlreadyActive { .. })
        ));
    }

    #[test]
    fn test_hub_activation_requires_supply_line() {
        let mut state = create_test_game();
        if let Some(node) = state.node_mut("hub") {
            node.standard_units = 6;
        }
        if let Some(node) = state.node_mut("cn") {
            node.is_command_node = false;
        }
        assert!(matches!(
            validate_action(
                &state,
                FactionId::FactionA,
                &Action::ActivateFabricationHub {
                    node_id: "hub".into()
                }
            ),
            Err(RuleViolation::Disconnected { .. })
        ));
    }

    #[test]
    fn test_evolve_requires_active_hub() {
        let mut state = create_test_game();
        let evolve = Action::EvolveUnits {
            node_id: "hub".into(),
            units_to_evolve: 1,
        };
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &evolve),
            Err(RuleViolation::HubInactive { .. })
        ));
        if let Some(node) = state.node_mut("hub") {
            node.is_hub_active = true;
        }
        assert_eq!(validate_action(&state, FactionId::FactionA, &evolve), Ok(()));

        let too_many = Action::EvolveUnits {
            node_id: "hub".into(),
            units_to_evolve: 3,
        };
        assert!(matches!(
            validate_action(&state, FactionId::FactionA, &too_many),
            Err(RuleViolation::InsufficientStandardUnits { .. })
        ));
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let state = create_test_game();
        let before = state.clone();
        let _ = validate_action(&state, FactionId::FactionA, &deploy("cn", 100));
        assert_eq!(state, before);
    }
}
