#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use noosphere::config::EngineConfig;
use noosphere::game::{apply_action, check_invariants, validate_action, Action, FactionId, Phase};
use noosphere::maps::{build_game, MapType};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One raw action: indices are reduced modulo the node count.
#[derive(Arbitrary, Debug)]
struct RawAction {
    /// Action kind selector.
    kind: u8,
    /// Faction B instead of A.
    second: bool,
    /// Source or target node index.
    from: u8,
    /// Destination node index.
    to: u8,
    /// Unit count.
    units: u8,
}

/// Structured input for batch fuzzing.
#[derive(Arbitrary, Debug)]
struct BatchInput {
    /// Map selector.
    continental: bool,
    /// Fog of war.
    fog: bool,
    /// Game seed.
    seed: u64,
    /// Extra starting QR per faction.
    bonus_qr: u16,
    /// The actions, applied in order when they validate.
    actions: Vec<RawAction>,
}

fuzz_target!(|input: BatchInput| {
    let map = if input.continental {
        MapType::Continental
    } else {
        MapType::Skirmish
    };
    let Ok(mut state) = build_game(map, input.fog, &EngineConfig::default(), input.seed) else {
        return;
    };
    for faction in FactionId::ALL {
        state.faction_mut(faction).qr += u32::from(input.bonus_qr);
    }
    let ids: Vec<String> = state.nodes.keys().cloned().collect();
    let mut dice = ChaCha8Rng::seed_from_u64(input.seed);

    for raw in input.actions.iter().take(256) {
        let from = ids[usize::from(raw.from) % ids.len()].clone();
        let to = ids[usize::from(raw.to) % ids.len()].clone();
        let units = u32::from(raw.units);
        let action = match raw.kind % 5 {
            0 => Action::DeployUnits { node_id: from, units },
            1 => Action::MoveUnits { from_node_id: from, to_node_id: to, units },
            2 => Action::AttackNode { from_node_id: from, to_node_id: to, units },
            3 => Action::ActivateFabricationHub { node_id: from },
            _ => Action::EvolveUnits { node_id: from, units_to_evolve: units },
        };
        state.current_phase = if matches!(action, Action::AttackNode { .. }) {
            Phase::Combat
        } else {
            Phase::Maneuver
        };
        let faction = if raw.second { FactionId::FactionB } else { FactionId::FactionA };

        let before = state.clone();
        match validate_action(&state, faction, &action) {
            Ok(()) => {
                apply_action(&mut state, faction, &action, &mut dice);
                let violations = check_invariants(&state);
                assert!(violations.is_empty(), "{action:?} broke invariants: {violations:?}");
            }
            Err(_) => assert_eq!(state, before, "validation mutated the state"),
        }
    }
});
