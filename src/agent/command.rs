//! Agent backed by an external program.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::agent::AgentGateway;
use crate::error::GatewayError;
use crate::game::FactionId;

/// Runs a shell command once per prompt.
///
/// The prompt goes to the program's stdin and its stdout is the reply. The
/// faction it plays is exported as `NOOSPHERE_FACTION`. A call that runs
/// past the timeout kills the program. On unix the program leads its own
/// process group and the whole group is killed, so helpers it forked do not
/// keep the reply pipe open.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    command: String,
    timeout: Duration,
}

impl CommandAgent {
    /// Create an agent for a shell command line.
    #[must_use]
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    fn spawn(&self, faction: FactionId) -> Result<Child, GatewayError> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .env("NOOSPHERE_FACTION", faction.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        Ok(command.spawn()?)
    }
}

/// Kill the agent and everything in its process group, then reap it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(err) = killed {
            tracing::warn!(%err, "could not signal agent process group");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

impl AgentGateway for CommandAgent {
    fn complete(&mut self, faction: FactionId, prompt: &str) -> Result<String, GatewayError> {
        let mut child = self.spawn(faction)?;
        tracing::debug!(command = %self.command, %faction, "spawned agent");

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GatewayError::Transport("agent stdin unavailable".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Transport("agent stdout unavailable".into()))?;

        let prompt = prompt.to_owned();
        // A program that never reads stdin must not block us; the write
        // fails with a broken pipe once it exits, which is fine.
        thread::spawn(move || {
            let _ = stdin.write_all(prompt.as_bytes());
        });

        let (sender, receiver) = bounded(1);
        thread::spawn(move || {
            let mut reply = String::new();
            let result = stdout.read_to_string(&mut reply).map(|_| reply);
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => {
                let reply = result?;
                let status = child.wait()?;
                if status.success() {
                    Ok(reply)
                } else {
                    Err(GatewayError::Exit {
                        code: status.code(),
                    })
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(command = %self.command, %faction, "agent timed out, killing it");
                terminate(&mut child);
                Err(GatewayError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                terminate(&mut child);
                Err(GatewayError::Transport("agent output reader stopped".into()))
            }
        }
    }

    fn name(&self) -> &str {
        &self.command
    }
}
