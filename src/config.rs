//! Engine and rule configuration.
//!
//! Every struct here deserializes with `#[serde(default)]`, so a JSON file
//! only needs the keys it overrides:
//!
//! ```json
//! { "maxTurns": 40, "rules": { "deployUnitCost": 8 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Costs and thresholds the action validator enforces.
///
/// Carried inside every `GameState` so saved games resume under the rules
/// they started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// QR per deployed unit.
    pub deploy_unit_cost: u32,
    /// QR to switch on a fabrication hub.
    pub hub_activation_cost: u32,
    /// Garrison a node needs before its hub can be activated.
    pub hub_min_garrison: u32,
    /// QR per evolved unit.
    pub evolve_unit_cost: u32,
    /// QR each faction starts with.
    pub starting_qr: u32,
    /// Flat bonus added to every die roll of a stack holding evolved units.
    pub evolved_combat_bonus: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            deploy_unit_cost: 10,
            hub_activation_cost: 40,
            hub_min_garrison: 5,
            evolve_unit_cost: 15,
            starting_qr: 50,
            evolved_combat_bonus: 5,
        }
    }
}

/// Per-turn probability of each fluctuation event.
///
/// The weights must sum to less than 1; the remainder is a stable turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FluctuationWeights {
    /// A faction gains QR.
    pub quantum_surge: f64,
    /// A faction loses QR.
    pub resonance_drain: f64,
    /// A faction node gains standard units.
    pub reinforcement: f64,
    /// A garrisoned node loses units.
    pub attrition: f64,
    /// A neutral node gains standard units.
    pub neutral_resurgence: f64,
}

impl Default for FluctuationWeights {
    fn default() -> Self {
        Self {
            quantum_surge: 0.10,
            resonance_drain: 0.08,
            reinforcement: 0.10,
            attrition: 0.10,
            neutral_resurgence: 0.07,
        }
    }
}

impl FluctuationWeights {
    /// Sum of all event weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.quantum_surge
            + self.resonance_drain
            + self.reinforcement
            + self.attrition
            + self.neutral_resurgence
    }

    /// Event weights in table order.
    #[must_use]
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.quantum_surge,
            self.resonance_drain,
            self.reinforcement,
            self.attrition,
            self.neutral_resurgence,
        ]
    }
}

/// Configuration for one game run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Game rules.
    pub rules: RuleSet,
    /// Extra attempts an agent gets after a rejected response.
    pub max_retries: u32,
    /// Last turn before the game is decided on score.
    pub max_turns: u32,
    /// Per-call agent timeout in milliseconds.
    pub gateway_timeout_ms: u64,
    /// System log ring-buffer capacity.
    pub system_log_cap: usize,
    /// Battle log ring-buffer capacity.
    pub battle_log_cap: usize,
    /// Fluctuation event table.
    pub fluctuation: FluctuationWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            max_retries: 2,
            max_turns: 30,
            gateway_timeout_ms: 60_000,
            system_log_cap: 250,
            battle_log_cap: 100,
            fluctuation: FluctuationWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails [`EngineConfig::from_json`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("maxTurns must be at least 1".into()));
        }
        if self.system_log_cap == 0 || self.battle_log_cap == 0 {
            return Err(ConfigError::Invalid("log capacities must be at least 1".into()));
        }
        let weights = self.fluctuation.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(
                "fluctuation weights must be finite and non-negative".into(),
            ));
        }
        if self.fluctuation.total() >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "fluctuation weights sum to {:.3}; they must leave room for a stable turn",
                self.fluctuation.total()
            )));
        }
        Ok(())
    }
}
