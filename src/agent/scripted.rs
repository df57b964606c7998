//! Agent that replays canned replies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::agent::AgentGateway;
use crate::error::GatewayError;
use crate::game::FactionId;

/// Reply of the idle agent: no actions.
pub const IDLE_REPLY: &str = r#"{"actions": [], "tacticalAnalysis": "Holding position."}"#;

/// Returns queued replies in order, then a fixed fallback forever.
///
/// Every prompt it receives is recorded in a shared log, so a test can keep
/// a handle to the log after handing the agent to an engine.
#[derive(Debug)]
pub struct ScriptedAgent {
    name: String,
    replies: VecDeque<Result<String, GatewayError>>,
    fallback: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAgent {
    /// Create an agent with an empty queue.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            name: "scripted".to_string(),
            replies: VecDeque::new(),
            fallback: fallback.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An agent that never acts.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            ..Self::new(IDLE_REPLY)
        }
    }

    /// Queue a reply.
    #[must_use]
    pub fn reply(mut self, raw: impl Into<String>) -> Self {
        self.replies.push_back(Ok(raw.into()));
        self
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(mut self, error: GatewayError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Shared log of every prompt received.
    #[must_use]
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl AgentGateway for ScriptedAgent {
    fn complete(&mut self, _faction: FactionId, prompt: &str) -> Result<String, GatewayError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
