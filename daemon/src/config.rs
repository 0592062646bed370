//! Simulator configuration with TOML file support.

use serde::{Deserialize, Serialize};

use accrue_types::{PoolParams, Timestamp};
use accrue_utils::LogFormat;

use crate::SimError;

/// Configuration for a simulation run.
///
/// Can be loaded from a TOML file via [`SimConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Reward units issued per second across the whole pool.
    #[serde(default = "default_reward_rate")]
    pub reward_rate: u64,

    /// Supported collection identifier.
    #[serde(default = "default_category_id")]
    pub category_id: u64,

    /// Pool creation time in seconds.
    #[serde(default)]
    pub genesis: u64,

    /// Reward currency the vault starts with.
    #[serde(default = "default_funding")]
    pub funding: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Positions minted to each holder before the script starts.
    #[serde(default)]
    pub holders: Vec<HolderConfig>,

    /// Positions the category validator rejects.
    #[serde(default)]
    pub unsupported: Vec<u64>,
}

/// An account and the positions it owns at the start of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderConfig {
    pub account: String,
    #[serde(default)]
    pub positions: Vec<u64>,
    /// Whether the holder has approved the pool to move its positions.
    #[serde(default = "default_true")]
    pub approved: bool,
    /// Collection the positions were minted in. Unset positions are
    /// accepted by a pool of any category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u64>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_reward_rate() -> u64 {
    100
}

fn default_category_id() -> u64 {
    1
}

fn default_funding() -> u64 {
    1_000_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, SimError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SimError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SimError> {
        toml::to_string_pretty(self).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn pool_params(&self) -> PoolParams {
        PoolParams::new(u128::from(self.reward_rate), Timestamp::new(self.genesis))
            .with_category(self.category_id)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            reward_rate: default_reward_rate(),
            category_id: default_category_id(),
            genesis: 0,
            funding: default_funding(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            holders: Vec::new(),
            unsupported: Vec::new(),
        }
    }
}
