//! Session controller: the user-facing intents around a running engine.

use std::fmt;

use crate::agent::AgentGateway;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::SessionError;
use crate::maps::{build_game, MapType};

/// Builds the two agents for a new game, faction A first.
pub type AgentFactory = Box<dyn FnMut() -> [Box<dyn AgentGateway>; 2] + Send>;

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Choose the map for the next game. Only valid before a game starts.
    SelectMap(MapType),
    /// Start a fresh game, discarding any previous one.
    StartGame {
        /// Map template; `None` plays the selected map.
        map_type: Option<MapType>,
        /// Hide the enemy's holdings from each agent.
        fog_of_war: bool,
    },
    /// Pause or resume the running game.
    PauseToggle,
}

/// Holds at most one engine and turns intents into engine calls.
pub struct Session {
    config: EngineConfig,
    selected_map: MapType,
    seed: u64,
    games_started: u64,
    agents: AgentFactory,
    engine: Option<Engine>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("selected_map", &self.selected_map)
            .field("seed", &self.seed)
            .field("games_started", &self.games_started)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an idle session. Each started game uses `seed` plus the number
    /// of games started before it.
    #[must_use]
    pub fn new(config: EngineConfig, seed: u64, agents: AgentFactory) -> Self {
        Self {
            config,
            selected_map: MapType::Skirmish,
            seed,
            games_started: 0,
            agents,
            engine: None,
        }
    }

    /// Map that the next `StartGame` falls back to.
    #[must_use]
    pub const fn selected_map(&self) -> MapType {
        self.selected_map
    }

    /// The current engine, if a game was started.
    #[must_use]
    pub const fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// Mutable access to the current engine.
    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    fn game_running(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|engine| !engine.state().is_game_over())
    }

    /// Apply one intent.
    ///
    /// # Errors
    ///
    /// - [`SessionError::GameInProgress`] when selecting a map mid-game.
    /// - [`SessionError::NoGame`] when toggling pause before any game.
    /// - [`SessionError::Map`] if the map template is broken.
    pub fn handle(&mut self, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::SelectMap(map_type) => {
                if self.game_running() {
                    return Err(SessionError::GameInProgress);
                }
                self.selected_map = map_type;
                tracing::info!(map = %map_type, "map selected");
            }
            Intent::StartGame {
                map_type,
                fog_of_war,
            } => {
                let map_type = map_type.unwrap_or(self.selected_map);
                let seed = self.seed.wrapping_add(self.games_started);
                let state = build_game(map_type, fog_of_war, &self.config, seed)?;
                let [agent_a, agent_b] = (self.agents)();
                self.selected_map = map_type;
                self.games_started += 1;
                self.engine = Some(Engine::new(state, self.config.clone(), agent_a, agent_b));
            }
            Intent::PauseToggle => {
                let engine = self.engine.as_ref().ok_or(SessionError::NoGame)?;
                let paused = engine.pause_handle().toggle();
                tracing::info!(paused, "pause toggled");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScriptedAgent;
    use crate::engine::StepOutcome;

    fn idle_agents() -> [Box<dyn AgentGateway>; 2] {
        [
            Box::new(ScriptedAgent::idle()),
            Box::new(ScriptedAgent::idle()),
        ]
    }

    fn idle_session() -> Session {
        Session::new(EngineConfig::default(), 9, Box::new(idle_agents))
    }

    #[test]
    fn test_select_map_before_start() {
        let mut session = idle_session();
        session.handle(Intent::SelectMap(MapType::Continental)).unwrap();
        assert_eq!(session.selected_map(), MapType::Continental);
        assert!(session.engine().is_none());
    }

    #[test]
    fn test_start_without_map_plays_selected_map() {
        let mut session = idle_session();
        session.handle(Intent::SelectMap(MapType::Continental)).unwrap();
        session
            .handle(Intent::StartGame {
                map_type: None,
                fog_of_war: false,
            })
            .unwrap();
        let state = session.engine().unwrap().state();
        assert_eq!(state.map_type, MapType::Continental);
    }

    #[test]
    fn test_select_map_rejected_mid_game() {
        let mut session = idle_session();
        session
            .handle(Intent::StartGame {
                map_type: Some(MapType::Skirmish),
                fog_of_war: false,
            })
            .unwrap();
        assert!(matches!(
            session.handle(Intent::SelectMap(MapType::Continental)),
            Err(SessionError::GameInProgress)
        ));
    }

    #[test]
    fn test_pause_without_game() {
        let mut session = idle_session();
        assert!(matches!(
            session.handle(Intent::PauseToggle),
            Err(SessionError::NoGame)
        ));
    }

    #[test]
    fn test_pause_toggle_reaches_engine() {
        let mut session = idle_session();
        session
            .handle(Intent::StartGame {
                map_type: Some(MapType::Continental),
                fog_of_war: true,
            })
            .unwrap();
        session.handle(Intent::PauseToggle).unwrap();
        let engine = session.engine_mut().unwrap();
        assert_eq!(engine.step(), StepOutcome::Paused);
        assert!(engine.state().is_fog_of_war_active);
    }

    #[test]
    fn test_restart_uses_next_seed() {
        let mut session = idle_session();
        let start = Intent::StartGame {
            map_type: Some(MapType::Skirmish),
            fog_of_war: false,
        };
        session.handle(start).unwrap();
        assert_eq!(session.engine().unwrap().state().seed, 9);
        session.handle(start).unwrap();
        assert_eq!(session.engine().unwrap().state().seed, 10);
    }
}
