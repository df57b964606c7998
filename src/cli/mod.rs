//! CLI command implementations for Noosphere.

pub(crate) mod batch;
pub(crate) mod inspect;
pub(crate) mod run;

mod agents;
mod output;

use clap::ValueEnum;
use noosphere::config::EngineConfig;
use noosphere::error::{ConfigError, MapError, PersistenceError};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Output format for game results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable sectioned text.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<MapError> for CliError {
    fn from(e: MapError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<PersistenceError> for CliError {
    fn from(e: PersistenceError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

/// Engine settings shared by the commands that play games.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EngineArgs {
    /// Engine config file (JSON); flags override it
    #[arg(long)]
    pub(crate) config: Option<std::path::PathBuf>,

    /// Turn limit
    #[arg(short = 't', long)]
    pub(crate) max_turns: Option<u32>,

    /// Retries after a rejected batch
    #[arg(short, long)]
    pub(crate) retries: Option<u32>,

    /// Agent for faction A: `idle` or a shell command
    #[arg(long, default_value = "idle")]
    pub(crate) agent_a: String,

    /// Agent for faction B: `idle` or a shell command
    #[arg(long, default_value = "idle")]
    pub(crate) agent_b: String,
}

impl EngineArgs {
    /// Load the config file, if any, then apply flag overrides.
    pub(crate) fn engine_config(&self) -> Result<EngineConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        if let Some(turns) = self.max_turns {
            config.max_turns = turns;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    let config = EngineConfig::load(path)?;
    tracing::debug!(path = %path.display(), "engine config loaded");
    Ok(config)
}

/// Seed from the flag, or from the clock.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42)
    })
}
