//! Agent selection from command-line arguments.

use super::EngineArgs;
use noosphere::agent::{AgentGateway, CommandAgent, ScriptedAgent};
use noosphere::config::EngineConfig;
use std::time::Duration;

/// Argument that selects the built-in agent that never acts.
const IDLE: &str = "idle";

/// Build an agent from its argument: `idle`, or a shell command line.
fn build_agent(choice: &str, timeout: Duration) -> Box<dyn AgentGateway> {
    if choice == IDLE {
        Box::new(ScriptedAgent::idle())
    } else {
        Box::new(CommandAgent::new(choice, timeout))
    }
}

/// The agent pair named on the command line, faction A first.
pub(super) fn build_pair(args: &EngineArgs, config: &EngineConfig) -> [Box<dyn AgentGateway>; 2] {
    let timeout = Duration::from_millis(config.gateway_timeout_ms);
    [
        build_agent(&args.agent_a, timeout),
        build_agent(&args.agent_b, timeout),
    ]
}
