//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Season identifier stamped on tally outcomes
    pub season_id: String,

    /// Data directory holding the governance event log
    pub data_dir: PathBuf,

    /// League roster file (YAML); omit to run the built-in demo league
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_file: Option<String>,

    /// Rule space catalog file (YAML); omit to use the built-in catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_space_file: Option<String>,
}

/// Input sanitizer ceilings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Maximum proposal text length in characters
    #[serde(default = "default_max_proposal_len")]
    pub max_proposal_len: usize,

    /// Maximum amendment text length in characters
    #[serde(default = "default_max_amendment_len")]
    pub max_amendment_len: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_proposal_len: default_max_proposal_len(),
            max_amendment_len: default_max_amendment_len(),
        }
    }
}

/// Interpretation trust boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Endpoint of the stateless interpretation service
    #[serde(default = "default_interpreter_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_interpreter_timeout")]
    pub timeout_secs: u64,

    /// Confidence floor below which a classification counts as ambiguous
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Let ambiguous classifications proceed to validation instead of
    /// rejecting them outright. The validator remains the backstop.
    #[serde(default)]
    pub fail_open: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_interpreter_endpoint(),
            timeout_secs: default_interpreter_timeout(),
            min_confidence: default_min_confidence(),
            fail_open: false,
        }
    }
}

/// Token grant amounts per tally boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_grant_propose")]
    pub grant_propose: u32,

    #[serde(default = "default_grant_amend")]
    pub grant_amend: u32,

    #[serde(default = "default_grant_boost")]
    pub grant_boost: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            grant_propose: default_grant_propose(),
            grant_amend: default_grant_amend(),
            grant_boost: default_grant_boost(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Maximum distinct parameter/effect mutations per proposal
    #[serde(default = "default_max_mutations")]
    pub max_mutations_per_proposal: usize,

    /// Simulation rounds per voting window (tally cadence)
    #[serde(default = "default_rounds_per_window")]
    pub rounds_per_window: u64,

    /// Seconds per simulation round in the daemon scheduler
    #[serde(default = "default_round_interval")]
    pub round_interval_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_mutations_per_proposal: default_max_mutations(),
            rounds_per_window: default_rounds_per_window(),
            round_interval_secs: default_round_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
        }
    }
}

// Defaults
fn default_max_proposal_len() -> usize {
    2000
}
fn default_max_amendment_len() -> usize {
    500
}
fn default_interpreter_endpoint() -> String {
    "http://127.0.0.1:8091/interpret".to_string()
}
fn default_interpreter_timeout() -> u64 {
    30
}
fn default_min_confidence() -> f64 {
    0.5
}
fn default_grant_propose() -> u32 {
    2
}
fn default_grant_amend() -> u32 {
    2
}
fn default_grant_boost() -> u32 {
    1
}
fn default_max_mutations() -> usize {
    3
}
fn default_rounds_per_window() -> u64 {
    4
}
fn default_round_interval() -> u64 {
    60
}
fn default_http_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                season_id: "season-1".to_string(),
                data_dir: PathBuf::from("/var/lib/floor-engine"),
                league_file: None,
                rule_space_file: None,
            },
            sanitizer: SanitizerConfig::default(),
            interpreter: InterpreterConfig::default(),
            tokens: TokenConfig::default(),
            governance: GovernanceConfig::default(),
            api: ApiConfig::default(),
        }
    }
}
