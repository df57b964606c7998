//! Scenario tests for the turn engine and the rules it enforces.
//!
//! Run with: cargo test --test turn_engine

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use noosphere::agent::{AgentGateway, ScriptedAgent, REJECTION_PREFIX};
use noosphere::config::EngineConfig;
use noosphere::engine::{Engine, StepOutcome};
use noosphere::error::{GatewayError, RuleViolation};
use noosphere::game::graph::link;
use noosphere::game::{
    apply_action, check_invariants, validate_action, visible_state, Action, Applied, FactionId,
    GameState, Node, NodeMap, Owner, Phase, ScriptedDice, VictoryRules, WinCondition, Winner,
};
use noosphere::maps::{build_game, MapType};
use noosphere::persistence::{load_game, save_game};

const A: FactionId = FactionId::FactionA;
const B: FactionId = FactionId::FactionB;

/// A's command node with 10 standard units next to a B outpost with 3, plus
/// B's command node further back so B is not eliminated by losing the outpost.
fn frontier_state(phase: Phase) -> GameState {
    let mut nodes = NodeMap::new();
    for node in [
        Node::new("a-cn", "Alpha Command", 50)
            .owned_by(A)
            .command_node()
            .with_qr_output(10)
            .with_units(10, 0),
        Node::new("b-out", "Beta Outpost", 20)
            .owned_by(B)
            .with_qr_output(3)
            .with_units(3, 0),
        Node::new("b-cn", "Beta Command", 50)
            .owned_by(B)
            .command_node()
            .with_qr_output(10)
            .with_units(8, 0),
        Node::new("a-hub", "Alpha Foundry", 20)
            .owned_by(A)
            .with_hub()
            .with_units(10, 0),
    ] {
        nodes.insert(node.id.clone(), node);
    }
    link(&mut nodes, "a-cn", "b-out");
    link(&mut nodes, "b-out", "b-cn");
    link(&mut nodes, "a-cn", "a-hub");

    let mut state = GameState::new(
        nodes,
        MapType::Skirmish,
        false,
        VictoryRules::new(1, 3),
        &EngineConfig::default(),
        7,
    );
    state.current_phase = phase;
    state
}

fn engine_with(state: GameState, agent_a: ScriptedAgent) -> Engine {
    Engine::new(
        state,
        EngineConfig::default(),
        Box::new(agent_a),
        Box::new(ScriptedAgent::idle()),
    )
}

fn batch(actions: &str) -> String {
    format!(r#"{{"actions": {actions}, "tacticalAnalysis": "scenario"}}"#)
}

fn prompts(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_two_node_attack_capture() {
    let mut state = frontier_state(Phase::Combat);
    let attack = Action::AttackNode {
        from_node_id: "a-cn".into(),
        to_node_id: "b-out".into(),
        units: 5,
    };
    validate_action(&state, A, &attack).unwrap();
    let applied = apply_action(&mut state, A, &attack, &mut ScriptedDice::attacker_favoured());

    let battle = match applied {
        Applied::Battle(battle) => battle,
        other => panic!("expected a battle, got {other:?}"),
    };
    assert!(battle.captured);
    assert_eq!(battle.attacker_losses, 0);
    assert_eq!(battle.defender_losses, 3);

    let captured = state.node("b-out").unwrap();
    assert_eq!(captured.owner, Owner::FactionA);
    assert_eq!(captured.total_units(), 5);
    assert_eq!(state.node("a-cn").unwrap().total_units(), 5);
    assert_eq!(state.faction(A).successful_attacks, 1);
    assert_eq!(state.faction(B).defenses_lost, 1);
    assert!(check_invariants(&state).is_empty());
}

#[test]
fn test_capture_overflow_returns_to_source_and_shuts_hub() {
    let mut nodes = NodeMap::new();
    let mut junction = Node::new("kj", "Beta Archive", 4)
        .owned_by(B)
        .knowledge_junction()
        .with_hub()
        .with_units(2, 0);
    junction.is_hub_active = true;
    for node in [
        Node::new("acn", "Alpha Command", 50)
            .owned_by(A)
            .command_node()
            .with_units(20, 0),
        junction,
        Node::new("bcn", "Beta Command", 50)
            .owned_by(B)
            .command_node()
            .with_units(8, 0),
    ] {
        nodes.insert(node.id.clone(), node);
    }
    link(&mut nodes, "acn", "kj");
    link(&mut nodes, "kj", "bcn");
    let mut state = GameState::new(
        nodes,
        MapType::Skirmish,
        false,
        VictoryRules::new(1, 3),
        &EngineConfig::default(),
        3,
    );
    state.current_phase = Phase::Combat;

    let attack = Action::AttackNode {
        from_node_id: "acn".into(),
        to_node_id: "kj".into(),
        units: 10,
    };
    validate_action(&state, A, &attack).unwrap();
    let applied = apply_action(&mut state, A, &attack, &mut ScriptedDice::attacker_favoured());
    let battle = match applied {
        Applied::Battle(battle) => battle,
        other => panic!("expected a battle, got {other:?}"),
    };
    assert!(battle.captured);
    assert_eq!(battle.returned_to_source, 6);

    let junction = state.node("kj").unwrap();
    assert_eq!(junction.owner, Owner::FactionA);
    assert_eq!(junction.total_units(), 4);
    assert!(!junction.is_hub_active);
    assert_eq!(state.node("acn").unwrap().total_units(), 16);
    assert!(check_invariants(&state).is_empty());
}

#[test]
fn test_engine_combat_turn_records_battle() {
    let agent = ScriptedAgent::idle().reply(batch(
        r#"[{"type": "ATTACK_NODE", "fromNodeId": "a-cn", "toNodeId": "b-out", "units": 9}]"#,
    ));
    let mut engine = engine_with(frontier_state(Phase::Combat), agent);
    assert_eq!(engine.step(), StepOutcome::Advanced);

    let state = engine.state();
    assert_eq!(state.battle_log.len(), 1);
    assert_eq!(state.active_player, B);
    assert_eq!(state.faction(A).successful_turn_attempts, 1);
    let battle = &state.battle_log[0];
    assert_eq!(battle.attacking_units.total(), 9);
    assert!(check_invariants(state).is_empty());
}

#[test]
fn test_evolve_on_inactive_hub_is_rejected_without_cost() {
    let state = frontier_state(Phase::Maneuver);
    let evolve = Action::EvolveUnits {
        node_id: "a-hub".into(),
        units_to_evolve: 1,
    };
    assert!(matches!(
        validate_action(&state, A, &evolve),
        Err(RuleViolation::HubInactive { .. })
    ));

    let agent = ScriptedAgent::new(batch(
        r#"[{"type": "EVOLVE_UNITS", "nodeId": "a-hub", "unitsToEvolve": 1}]"#,
    ));
    let log = agent.prompt_log();
    let mut engine = engine_with(state, agent);
    engine.step();

    let state = engine.state();
    assert_eq!(state.faction(A).qr, 50);
    assert_eq!(state.faction(A).failed_turn_attempts, 1);
    assert_eq!(state.node("a-hub").unwrap().evolved_units, 0);
    let sent = prompts(&log);
    assert_eq!(sent.len(), 3);
    assert!(sent[1].starts_with(REJECTION_PREFIX));
    assert!(sent[1].contains("is not active"));
}

#[test]
fn test_hub_activated_earlier_in_batch_allows_evolution() {
    let mut state = frontier_state(Phase::Maneuver);
    state.faction_mut(A).qr = 100;
    let agent = ScriptedAgent::idle().reply(batch(
        r#"[
            {"type": "ACTIVATE_FABRICATION_HUB", "nodeId": "a-hub"},
            {"type": "EVOLVE_UNITS", "nodeId": "a-hub", "unitsToEvolve": 2}
        ]"#,
    ));
    let mut engine = engine_with(state, agent);
    engine.step();

    let state = engine.state();
    let hub = state.node("a-hub").unwrap();
    assert!(hub.is_hub_active);
    assert_eq!(hub.evolved_units, 2);
    assert_eq!(hub.standard_units, 8);
    assert_eq!(state.faction(A).qr, 100 - 40 - 30);
}

#[test]
fn test_malformed_replies_exhaust_retries_and_advance() {
    let agent = ScriptedAgent::new("I would rather not answer in JSON.");
    let log = agent.prompt_log();
    let mut engine = engine_with(frontier_state(Phase::Maneuver), agent);
    let before = engine.state().nodes.clone();

    assert_eq!(engine.step(), StepOutcome::Advanced);

    let state = engine.state();
    assert_eq!(state.faction(A).failed_turn_attempts, 1);
    assert_eq!(state.faction(A).successful_turn_attempts, 0);
    assert!(state.faction(A).last_error.is_some());
    assert_eq!(state.current_phase, Phase::Maneuver);
    assert_eq!(state.active_player, B);
    assert_eq!(state.nodes, before);
    assert_eq!(prompts(&log).len(), 3);
}

#[test]
fn test_retry_recovers_after_feedback() {
    let agent = ScriptedAgent::idle()
        .reply("```json\n{\"actions\": [\n```")
        .reply(batch(r#"[{"type": "DEPLOY_UNITS", "nodeId": "a-cn", "units": 2}]"#));
    let log = agent.prompt_log();
    let mut engine = engine_with(frontier_state(Phase::Maneuver), agent);
    engine.step();

    let state = engine.state();
    let faction = state.faction(A);
    assert_eq!(faction.successful_turn_attempts, 1);
    assert_eq!(faction.failed_turn_attempts, 0);
    assert_eq!(faction.last_error, None);
    assert_eq!(faction.qr, 30);
    assert_eq!(faction.tactical_analysis_history.len(), 1);
    assert_eq!(faction.tactical_analysis_history[0].phase, Phase::Maneuver);

    let sent = prompts(&log);
    assert_eq!(sent.len(), 2);
    assert!(!sent[0].starts_with(REJECTION_PREFIX));
    assert!(sent[1].starts_with(REJECTION_PREFIX));
    assert!(sent[1].contains("malformed response"));
}

#[test]
fn test_gateway_timeout_counts_as_failed_attempt() {
    let agent = ScriptedAgent::idle().fail(GatewayError::Timeout(Duration::from_secs(60)));
    let log = agent.prompt_log();
    let mut engine = engine_with(frontier_state(Phase::Combat), agent);
    engine.step();

    let state = engine.state();
    assert_eq!(state.faction(A).successful_turn_attempts, 1);
    let sent = prompts(&log);
    assert_eq!(sent.len(), 2);
    assert!(sent[1].contains("did not answer"));
}

#[test]
fn test_deploy_debits_cost_per_unit() {
    let agent = ScriptedAgent::idle()
        .reply(batch(r#"[{"type": "DEPLOY_UNITS", "nodeId": "a-cn", "units": 3}]"#));
    let mut engine = engine_with(frontier_state(Phase::Maneuver), agent);
    engine.step();

    let state = engine.state();
    assert_eq!(state.faction(A).qr, 50 - 3 * 10);
    assert_eq!(state.faction(A).units_purchased, 3);
    assert_eq!(state.node("a-cn").unwrap().standard_units, 13);
}

#[test]
fn test_rejected_batch_leaves_no_partial_effects() {
    // The second deploy needs 60 QR after the first spent 20.
    let agent = ScriptedAgent::new(batch(
        r#"[
            {"type": "DEPLOY_UNITS", "nodeId": "a-cn", "units": 2},
            {"type": "DEPLOY_UNITS", "nodeId": "a-cn", "units": 6}
        ]"#,
    ));
    let log = agent.prompt_log();
    let mut engine = engine_with(frontier_state(Phase::Maneuver), agent);
    engine.step();

    let state = engine.state();
    assert_eq!(state.faction(A).qr, 50);
    assert_eq!(state.faction(A).units_purchased, 0);
    assert_eq!(state.node("a-cn").unwrap().standard_units, 10);
    assert_eq!(state.faction(A).failed_turn_attempts, 1);
    assert!(prompts(&log)[1].contains("action #2 (DEPLOY_UNITS) rejected"));
}

#[test]
fn test_fog_view_hides_distant_nodes() {
    let state = build_game(MapType::Continental, true, &EngineConfig::default(), 3).unwrap();
    let view = visible_state(&state, A);

    let owned: Vec<&str> = state
        .nodes
        .values()
        .filter(|node| node.owner == Owner::FactionA)
        .map(|node| node.id.as_str())
        .collect();
    for node in &view.map_nodes {
        if owned.contains(&node.id.as_str()) {
            continue;
        }
        let adjacent = owned
            .iter()
            .any(|id| state.node(id).unwrap().is_adjacent_to(&node.id));
        assert!(adjacent, "{} leaked into the fog view", node.id);
        assert_eq!(node.owner, Owner::Unknown);
        assert_eq!(node.total_units(), 0);
        assert!(!node.has_fabrication_hub);
        assert!(!node.is_hub_active);
    }
    assert!(view.map_nodes.iter().all(|node| node.id != "b-core"));

    let enemy = view.factions.iter().find(|f| f.id == B).unwrap();
    assert_eq!(enemy.qr, 0);
    assert_eq!(enemy.nodes_controlled, 0);
}

#[test]
fn test_knowledge_streak_wins_on_target_turn() {
    let mut nodes = NodeMap::new();
    for node in [
        Node::new("a-cn", "Alpha Command", 50)
            .owned_by(A)
            .command_node()
            .with_units(8, 0),
        Node::new("kj-1", "First Junction", 30)
            .owned_by(A)
            .knowledge_junction()
            .with_units(4, 0),
        Node::new("kj-2", "Second Junction", 30)
            .owned_by(A)
            .knowledge_junction()
            .with_units(4, 0),
        Node::new("kj-3", "Third Junction", 30)
            .knowledge_junction()
            .with_units(4, 0),
        Node::new("b-cn", "Beta Command", 50)
            .owned_by(B)
            .command_node()
            .with_units(8, 0),
    ] {
        nodes.insert(node.id.clone(), node);
    }
    link(&mut nodes, "a-cn", "kj-1");
    link(&mut nodes, "a-cn", "kj-2");
    link(&mut nodes, "kj-2", "kj-3");
    link(&mut nodes, "kj-3", "b-cn");

    let state = GameState::new(
        nodes,
        MapType::Skirmish,
        false,
        VictoryRules::new(2, 3),
        &EngineConfig::default(),
        11,
    );
    let mut engine = Engine::new(
        state,
        EngineConfig::default(),
        Box::new(ScriptedAgent::idle()),
        Box::new(ScriptedAgent::idle()),
    );

    assert_eq!(engine.run(), StepOutcome::GameOver(Winner::FactionA));
    let state = engine.state();
    assert_eq!(state.turn, 3);
    assert_eq!(state.win_condition, Some(WinCondition::KnowledgeControl));
    assert_eq!(state.faction(A).kj_streak, 3);
    assert_eq!(state.current_phase, Phase::GameOver);
}

#[test]
fn test_saved_game_resumes_identically() {
    let config = EngineConfig {
        max_turns: 4,
        ..EngineConfig::default()
    };
    let idle = || -> Box<dyn AgentGateway> { Box::new(ScriptedAgent::idle()) };
    let state = build_game(MapType::Skirmish, false, &config, 99).unwrap();
    let mut original = Engine::new(state, config.clone(), idle(), idle());
    for _ in 0..8 {
        original.step();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("midgame.json");
    save_game(original.state(), &path).unwrap();
    let loaded = load_game(&path).unwrap();
    assert_eq!(&loaded, original.state());

    let mut resumed = Engine::new(loaded, config, idle(), idle());
    original.run();
    resumed.run();
    assert_eq!(resumed.state(), original.state());
    assert_eq!(resumed.state().win_condition, Some(WinCondition::TurnLimit));
}
