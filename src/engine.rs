//! The turn engine.
//!
//! Runs one game as a strict phase cycle:
//!
//! ```text
//! FLUCTUATION -> RESOURCE -> MANEUVER(A) -> MANEUVER(B)
//!             -> COMBAT(A) -> COMBAT(B) -> turn end -> FLUCTUATION | GAME_OVER
//! ```
//!
//! Each call to [`Engine::step`] runs exactly one entry of that cycle. Agent
//! sub-turns stage their whole action batch on a copy of the state and only
//! commit it once every action validated, so a rejected or interrupted batch
//! leaves no trace.

mod session;

pub use session::{AgentFactory, Intent, Session};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::agent::{render_prompt, AgentGateway};
use crate::config::EngineConfig;
use crate::error::TurnError;
use crate::game::{
    apply_action, assert_invariants, collect_resources, evaluate_turn_end,
    fluctuation::run_fluctuation, parse_response, validate_action, visible_state, FactionId,
    GameState, LogLevel, Phase, TacticalAnalysis, Winner,
};

/// Clonable pause switch shared with other threads.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    /// Flip the switch, returning the new paused state.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::SeqCst)
    }

    /// Set the switch.
    pub fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::SeqCst);
    }

    /// Whether the engine should stop advancing.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One phase ran.
    Advanced,
    /// Nothing ran because the engine is paused.
    Paused,
    /// The game is decided.
    GameOver(Winner),
}

/// One game in progress.
pub struct Engine {
    state: GameState,
    config: EngineConfig,
    agents: [Box<dyn AgentGateway>; 2],
    pause: PauseHandle,
    observers: Vec<Sender<GameState>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("turn", &self.state.turn)
            .field("phase", &self.state.current_phase)
            .field("agent_a", &self.agents[0].name())
            .field("agent_b", &self.agents[1].name())
            .field("paused", &self.pause.is_paused())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Wrap a game state with the agents for faction A and B.
    #[must_use]
    pub fn new(
        state: GameState,
        config: EngineConfig,
        agent_a: Box<dyn AgentGateway>,
        agent_b: Box<dyn AgentGateway>,
    ) -> Self {
        let pause = PauseHandle::default();
        pause.set(state.is_paused);
        Self {
            state,
            config,
            agents: [agent_a, agent_b],
            pause,
            observers: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Consume the engine, returning its state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle for pausing from another thread.
    #[must_use]
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Receive a snapshot of the state after every phase.
    pub fn subscribe(&mut self) -> Receiver<GameState> {
        let (sender, receiver) = unbounded();
        self.observers.push(sender);
        receiver
    }

    fn publish(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.state.clone();
        self.observers
            .retain(|observer| observer.send(snapshot.clone()).is_ok());
    }

    /// Run the next phase of the cycle.
    pub fn step(&mut self) -> StepOutcome {
        if let Some(winner) = self.state.winner {
            return StepOutcome::GameOver(winner);
        }
        let paused = self.pause.is_paused();
        if paused != self.state.is_paused {
            self.state.is_paused = paused;
            let verb = if paused { "paused" } else { "resumed" };
            self.state.log(LogLevel::Info, format!("Game {verb}"));
            self.publish();
        }
        if paused {
            return StepOutcome::Paused;
        }

        match self.state.current_phase {
            Phase::Fluctuation => {
                run_fluctuation(&mut self.state, &self.config.fluctuation);
                self.state.current_phase = Phase::Resource;
            }
            Phase::Resource => {
                collect_resources(&mut self.state);
                self.state.current_phase = Phase::Maneuver;
                self.state.active_player = FactionId::FactionA;
            }
            Phase::Maneuver => {
                let faction = self.state.active_player;
                self.run_sub_turn(faction);
                match faction {
                    FactionId::FactionA => self.state.active_player = FactionId::FactionB,
                    FactionId::FactionB => {
                        self.state.current_phase = Phase::Combat;
                        self.state.active_player = FactionId::FactionA;
                    }
                }
            }
            Phase::Combat => {
                let faction = self.state.active_player;
                self.run_sub_turn(faction);
                match faction {
                    FactionId::FactionA => self.state.active_player = FactionId::FactionB,
                    FactionId::FactionB => self.finish_turn(),
                }
            }
            Phase::GameOver => {}
        }

        assert_invariants(&self.state);
        self.publish();
        match self.state.winner {
            Some(winner) => StepOutcome::GameOver(winner),
            None => StepOutcome::Advanced,
        }
    }

    /// Step until the game ends or the engine is paused.
    pub fn run(&mut self) -> StepOutcome {
        loop {
            match self.step() {
                StepOutcome::Advanced => {}
                outcome => return outcome,
            }
        }
    }

    fn finish_turn(&mut self) {
        self.state.refresh_hub_links();
        self.state.recompute_aggregates();
        if let Some((winner, condition)) = evaluate_turn_end(&mut self.state) {
            self.state.declare(winner, condition);
            return;
        }
        self.state.turn += 1;
        self.state.current_phase = Phase::Fluctuation;
        self.state.active_player = FactionId::FactionA;
        tracing::debug!(turn = self.state.turn, "turn started");
    }

    /// Run one faction's sub-turn with the retry protocol.
    fn run_sub_turn(&mut self, faction: FactionId) {
        let attempts = self.config.max_retries + 1;
        let mut feedback: Option<String> = None;

        for attempt in 1..=attempts {
            match self.attempt(faction, feedback.as_deref()) {
                Ok(staged) => {
                    self.state = staged;
                    tracing::debug!(%faction, attempt, "batch committed");
                    return;
                }
                Err(error) => {
                    let reason = error.to_string();
                    self.state.log(
                        LogLevel::Warning,
                        format!("{faction} attempt {attempt}/{attempts} rejected: {reason}"),
                    );
                    self.state.faction_mut(faction).last_error = Some(reason.clone());
                    feedback = Some(reason);
                }
            }
        }

        self.state.faction_mut(faction).failed_turn_attempts += 1;
        self.state.log(
            LogLevel::Error,
            format!(
                "{faction} failed its {} sub-turn after {attempts} attempts; no actions applied",
                self.state.current_phase
            ),
        );
    }

    /// One attempt: prompt, parse, then validate and apply on a staged copy.
    fn attempt(
        &mut self,
        faction: FactionId,
        feedback: Option<&str>,
    ) -> Result<GameState, TurnError> {
        let request = visible_state(&self.state, faction);
        let prompt =
            render_prompt(&request, &self.state.rules, feedback).map_err(TurnError::Encode)?;
        let raw = self.agents[faction.index()].complete(faction, &prompt)?;
        let response = parse_response(&raw)?;

        let mut staged = self.state.clone();
        let mut dice = staged.next_rng();
        for (index, action) in response.actions.iter().enumerate() {
            validate_action(&staged, faction, action).map_err(|violation| TurnError::Rule {
                index: index + 1,
                action: action.kind(),
                violation,
            })?;
            apply_action(&mut staged, faction, action, &mut dice);
        }

        let turn = staged.turn;
        let phase = staged.current_phase;
        let record = staged.faction_mut(faction);
        record.tactical_analysis_history.push(TacticalAnalysis {
            turn,
            phase,
            text: response.tactical_analysis,
        });
        record.successful_turn_attempts += 1;
        record.last_error = None;
        staged.log(
            LogLevel::Info,
            format!(
                "{faction} {phase} batch accepted ({} actions)",
                response.actions.len()
            ),
        );
        assert_invariants(&staged);
        Ok(staged)
    }
}
