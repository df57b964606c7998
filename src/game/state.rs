//! Game state management.

use std::collections::VecDeque;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, RuleSet};
use crate::game::{
    graph, BattleLogEntry, Faction, FactionId, Node, NodeMap, Owner, VictoryRules,
};
use crate::maps::MapType;

/// Multiplier spreading successive RNG draws across the seed space.
const RNG_STREAM_STRIDE: u64 = 6_364_136_223_846_793_005;

/// Phases of a turn, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Random event roll.
    Fluctuation,
    /// Income from supplied nodes.
    Resource,
    /// Deploy, move, hub activation and evolution, one faction at a time.
    Maneuver,
    /// Attacks, one faction at a time.
    Combat,
    /// The game is decided.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Fluctuation => write!(f, "FLUCTUATION"),
            Phase::Resource => write!(f, "RESOURCE"),
            Phase::Maneuver => write!(f, "MANEUVER"),
            Phase::Combat => write!(f, "COMBAT"),
            Phase::GameOver => write!(f, "GAME_OVER"),
        }
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Faction A won.
    FactionA,
    /// Faction B won.
    FactionB,
    /// Nobody won.
    Draw,
}

impl From<FactionId> for Winner {
    fn from(faction: FactionId) -> Self {
        match faction {
            FactionId::FactionA => Winner::FactionA,
            FactionId::FactionB => Winner::FactionB,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::FactionA => write!(f, "FactionA"),
            Winner::FactionB => write!(f, "FactionB"),
            Winner::Draw => write!(f, "Draw"),
        }
    }
}

/// Which win condition ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinCondition {
    /// Knowledge-junction control streak.
    KnowledgeControl,
    /// One or both factions eliminated.
    Annihilation,
    /// Turn limit reached, decided on score.
    TurnLimit,
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinCondition::KnowledgeControl => write!(f, "knowledge-junction control"),
            WinCondition::Annihilation => write!(f, "annihilation"),
            WinCondition::TurnLimit => write!(f, "turn limit"),
        }
    }
}

/// Severity of a system log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Routine progress.
    Info,
    /// A random event fired.
    Event,
    /// Something was rejected or capped.
    Warning,
    /// An agent sub-turn failed entirely.
    Error,
}

/// One line of the system log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Turn the entry was written.
    pub turn: u32,
    /// Phase the entry was written in.
    pub phase: Phase,
    /// Severity.
    pub level: LogLevel,
    /// Text.
    pub message: String,
}

/// The two playing factions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factions {
    /// Faction A.
    #[serde(rename = "FactionA")]
    pub faction_a: Faction,
    /// Faction B.
    #[serde(rename = "FactionB")]
    pub faction_b: Faction,
}

impl Factions {
    /// Create both factions with the same treasury.
    #[must_use]
    pub fn new(starting_qr: u32) -> Self {
        Self {
            faction_a: Faction::new(FactionId::FactionA, starting_qr),
            faction_b: Faction::new(FactionId::FactionB, starting_qr),
        }
    }

    /// Borrow one faction.
    #[must_use]
    pub const fn get(&self, id: FactionId) -> &Faction {
        match id {
            FactionId::FactionA => &self.faction_a,
            FactionId::FactionB => &self.faction_b,
        }
    }

    /// Mutably borrow one faction.
    pub fn get_mut(&mut self, id: FactionId) -> &mut Faction {
        match id {
            FactionId::FactionA => &mut self.faction_a,
            FactionId::FactionB => &mut self.faction_b,
        }
    }

    /// Both factions in acting order.
    pub fn iter(&self) -> impl Iterator<Item = &Faction> {
        [&self.faction_a, &self.faction_b].into_iter()
    }
}

/// Complete game state.
///
/// Plain data end to end: serializing to JSON and back yields an identical
/// value, which is what save/resume relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current turn (1-based).
    pub turn: u32,
    /// Phase that runs on the next engine step.
    pub current_phase: Phase,
    /// Faction whose maneuver or combat sub-turn is next.
    pub active_player: FactionId,
    /// The map.
    pub nodes: NodeMap,
    /// Both factions.
    pub factions: Factions,
    /// Bounded engine log, oldest first.
    pub system_log: VecDeque<LogEntry>,
    /// Bounded battle log, oldest first.
    pub battle_log: VecDeque<BattleLogEntry>,
    /// Template the map was built from.
    pub map_type: MapType,
    /// Whether agents receive filtered views.
    pub is_fog_of_war_active: bool,
    /// Whether the turn loop is paused.
    pub is_paused: bool,
    /// Result once the game is decided.
    pub winner: Option<Winner>,
    /// Condition that decided the game.
    pub win_condition: Option<WinCondition>,
    /// Knowledge-junction thresholds for this map.
    pub victory: VictoryRules,
    /// Rules in force.
    pub rules: RuleSet,
    /// Turn after which the game is decided on score.
    pub max_turns: u32,
    /// Seed of the game's random stream.
    pub seed: u64,
    /// Number of random streams drawn so far.
    pub rng_counter: u64,
    /// System log capacity.
    pub system_log_cap: usize,
    /// Battle log capacity.
    pub battle_log_cap: usize,
}

impl GameState {
    /// Create a game at turn 1, fluctuation phase.
    #[must_use]
    pub fn new(
        nodes: NodeMap,
        map_type: MapType,
        fog_of_war: bool,
        victory: VictoryRules,
        config: &EngineConfig,
        seed: u64,
    ) -> Self {
        let mut state = Self {
            turn: 1,
            current_phase: Phase::Fluctuation,
            active_player: FactionId::FactionA,
            nodes,
            factions: Factions::new(config.rules.starting_qr),
            system_log: VecDeque::new(),
            battle_log: VecDeque::new(),
            map_type,
            is_fog_of_war_active: fog_of_war,
            is_paused: false,
            winner: None,
            win_condition: None,
            victory,
            rules: config.rules,
            max_turns: config.max_turns,
            seed,
            rng_counter: 0,
            system_log_cap: config.system_log_cap,
            battle_log_cap: config.battle_log_cap,
        };
        state.recompute_aggregates();
        state
    }

    /// Get a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable node by id.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Borrow a faction.
    #[must_use]
    pub const fn faction(&self, id: FactionId) -> &Faction {
        self.factions.get(id)
    }

    /// Mutably borrow a faction.
    pub fn faction_mut(&mut self, id: FactionId) -> &mut Faction {
        self.factions.get_mut(id)
    }

    /// Whether a winner has been declared.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Append to the system log, dropping the oldest entry beyond capacity.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Event => {
                tracing::info!(turn = self.turn, phase = %self.current_phase, "{message}");
            }
            LogLevel::Warning => {
                tracing::warn!(turn = self.turn, phase = %self.current_phase, "{message}");
            }
            LogLevel::Error => {
                tracing::error!(turn = self.turn, phase = %self.current_phase, "{message}");
            }
        }
        self.system_log.push_back(LogEntry {
            turn: self.turn,
            phase: self.current_phase,
            level,
            message,
        });
        while self.system_log.len() > self.system_log_cap {
            self.system_log.pop_front();
        }
    }

    /// Append to the battle log, dropping the oldest entry beyond capacity.
    pub fn record_battle(&mut self, entry: BattleLogEntry) {
        self.battle_log.push_back(entry);
        while self.battle_log.len() > self.battle_log_cap {
            self.battle_log.pop_front();
        }
    }

    /// Draw a fresh random stream.
    ///
    /// Each stream is derived from the game seed and a counter stored in the
    /// state, so a saved game continues with the same randomness it would
    /// have had without the save.
    pub fn next_rng(&mut self) -> ChaCha8Rng {
        self.rng_counter += 1;
        ChaCha8Rng::seed_from_u64(
            self.seed
                .wrapping_add(self.rng_counter.wrapping_mul(RNG_STREAM_STRIDE)),
        )
    }

    /// Recompute every faction's aggregate counters from the node set.
    pub fn recompute_aggregates(&mut self) {
        for id in FactionId::ALL {
            let mut nodes_controlled = 0;
            let mut standard = 0;
            let mut evolved = 0;
            let mut kjs = 0;
            let mut hubs = 0;
            for node in graph::owned_by(&self.nodes, id) {
                nodes_controlled += 1;
                standard += node.standard_units;
                evolved += node.evolved_units;
                if node.is_hub_active {
                    hubs += 1;
                }
                if node.is_knowledge_junction
                    && graph::is_connected_to_command_node(&node.id, id, &self.nodes)
                {
                    kjs += 1;
                }
            }
            let faction = self.factions.get_mut(id);
            faction.nodes_controlled = nodes_controlled;
            faction.total_standard_units = standard;
            faction.total_evolved_units = evolved;
            faction.kjs_held = kjs;
            faction.active_hubs_count = hubs;
        }
    }

    /// Update supply bookkeeping for every active hub.
    ///
    /// A hub that loses its supply line is marked with the current turn; if it
    /// is still cut off on a later turn-end check it shuts down. Returns the
    /// ids of the hubs that shut down.
    pub fn refresh_hub_links(&mut self) -> Vec<String> {
        let turn = self.turn;
        let statuses: Vec<(String, bool)> = self
            .nodes
            .values()
            .filter(|node| node.is_hub_active)
            .map(|node| {
                let connected = node.owner.faction().is_some_and(|owner| {
                    graph::is_connected_to_command_node(&node.id, owner, &self.nodes)
                });
                (node.id.clone(), connected)
            })
            .collect();

        let mut shut_down = Vec::new();
        for (id, connected) in statuses {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if connected {
                node.hub_disconnected_turn = None;
                continue;
            }
            match node.hub_disconnected_turn {
                None => node.hub_disconnected_turn = Some(turn),
                Some(lost_on) if lost_on < turn => {
                    node.deactivate_hub();
                    shut_down.push(id);
                }
                Some(_) => {}
            }
        }

        for id in &shut_down {
            self.log(
                LogLevel::Warning,
                format!("Fabrication hub at {id} shut down after losing its supply line"),
            );
        }
        shut_down
    }

    /// Declare the result and freeze the state.
    pub fn declare(&mut self, winner: Winner, condition: WinCondition) {
        self.winner = Some(winner);
        self.win_condition = Some(condition);
        self.current_phase = Phase::GameOver;
        self.log(
            LogLevel::Info,
            format!("Game over on turn {}: {winner} by {condition}", self.turn),
        );
    }

    /// Owner of a node, `Neutral` if the id is unknown.
    #[must_use]
    pub fn owner_of(&self, id: &str) -> Owner {
        self.nodes.get(id).map_or(Owner::Neutral, |node| node.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::graph::link;

    fn create_test_game() -> GameState {
        let mut nodes = NodeMap::new();
        for node in [
            Node::new("cn", "Command", 20)
                .owned_by(FactionId::FactionA)
                .command_node()
                .with_units(5, 0),
            Node::new("kj", "Junction", 20)
                .owned_by(FactionId::FactionA)
                .knowledge_junction()
                .with_hub()
                .with_units(2, 1),
            Node::new("bcn", "Enemy Command", 20)
                .owned_by(FactionId::FactionB)
                .command_node()
                .with_units(4, 0),
        ] {
            nodes.insert(node.id.clone(), node);
        }
        link(&mut nodes, "cn", "kj");
        link(&mut nodes, "kj", "bcn");
        GameState::new(
            nodes,
            MapType::Skirmish,
            false,
            VictoryRules::new(1, 3),
            &EngineConfig::default(),
            7,
        )
    }

    #[test]
    fn test_game_state_creation() {
        let game = create_test_game();
        assert_eq!(game.turn, 1);
        assert_eq!(game.current_phase, Phase::Fluctuation);
        assert!(!game.is_game_over());
        assert_eq!(game.faction(FactionId::FactionA).qr, 50);
    }

    #[test]
    fn test_aggregates() {
        let game = create_test_game();
        let a = game.faction(FactionId::FactionA);
        assert_eq!(a.nodes_controlled, 2);
        assert_eq!(a.total_standard_units, 7);
        assert_eq!(a.total_evolved_units, 1);
        assert_eq!(a.kjs_held, 1);
        let b = game.faction(FactionId::FactionB);
        assert_eq!(b.nodes_controlled, 1);
        assert_eq!(b.kjs_held, 0);
    }

    #[test]
    fn test_system_log_is_bounded() {
        let mut game = create_test_game();
        game.system_log_cap = 3;
        for i in 0..5 {
            game.log(LogLevel::Info, format!("entry {i}"));
        }
        assert_eq!(game.system_log.len(), 3);
        assert_eq!(game.system_log[0].message, "entry 2");
    }

    #[test]
    fn test_rng_streams_differ_and_replay() {
        use rand::Rng;
        let mut game = create_test_game();
        let first: u64 = game.next_rng().random();
        let second: u64 = game.next_rng().random();
        assert_ne!(first, second);

        let mut replay = create_test_game();
        let again: u64 = replay.next_rng().random();
        assert_eq!(first, again);
    }

    #[test]
    fn test_hub_shuts_down_after_second_disconnected_check() {
        let mut game = create_test_game();
        if let Some(kj) = game.node_mut("kj") {
            kj.is_hub_active = true;
        }
        // Cut the supply line.
        if let Some(cn) = game.node_mut("cn") {
            cn.owner = Owner::FactionB;
        }

        assert!(game.refresh_hub_links().is_empty());
        assert_eq!(game.node("kj").unwrap().hub_disconnected_turn, Some(1));
        assert!(game.node("kj").unwrap().is_hub_active);

        // Same turn: still a grace period.
        assert!(game.refresh_hub_links().is_empty());

        game.turn = 2;
        assert_eq!(game.refresh_hub_links(), vec!["kj".to_string()]);
        let kj = game.node("kj").unwrap();
        assert!(!kj.is_hub_active);
        assert_eq!(kj.hub_disconnected_turn, None);
    }

    #[test]
    fn test_reconnected_hub_clears_marker() {
        let mut game = create_test_game();
        if let Some(kj) = game.node_mut("kj") {
            kj.is_hub_active = true;
            kj.hub_disconnected_turn = Some(1);
        }
        game.turn = 2;
        assert!(game.refresh_hub_links().is_empty());
        assert_eq!(game.node("kj").unwrap().hub_disconnected_turn, None);
    }

    #[test]
    fn test_declare_sets_game_over() {
        let mut game = create_test_game();
        game.declare(Winner::Draw, WinCondition::Annihilation);
        assert!(game.is_game_over());
        assert_eq!(game.current_phase, Phase::GameOver);
    }
}
