//! Engine configuration, loaded from a JSON file and handed to the engine explicitly.

use crate::domain::account::FeeRate;
use crate::error::{PainError, Result};
use serde::Deserialize;
use std::path::Path;

/// What to do with a transaction leg whose account belongs to another bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteLegPolicy {
    /// Record the leg on the ledger without mutating any local balance.
    #[default]
    LedgerOnly,
    /// Refuse the whole transaction with `RoutingUnsupportedError`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuthPair {
    pub user: String,
    pub password: String,
}

/// Credentials accepted by the static authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub basic: Vec<BasicAuthPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Fraction of every amount collected into the holding account.
    #[serde(default)]
    pub fee_rate: FeeRate,
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
    #[serde(default)]
    pub remote_legs: RemoteLegPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_per_page() -> usize {
    10
}

fn default_max_per_page() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: FeeRate::ZERO,
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            remote_legs: RemoteLegPolicy::default(),
            log_level: default_log_level(),
            auth: AuthConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_fee_rate(mut self, fee_rate: FeeRate) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    pub fn with_remote_legs(mut self, policy: RemoteLegPolicy) -> Self {
        self.remote_legs = policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PainError::ConfigError(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PainError::ConfigError(format!("Cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.default_per_page == 0 || self.max_per_page == 0 {
            return Err(PainError::ConfigError(
                "Page sizes must be positive".to_string(),
            ));
        }
        if self.default_per_page > self.max_per_page {
            return Err(PainError::ConfigError(format!(
                "default_per_page {} exceeds max_per_page {}",
                self.default_per_page, self.max_per_page
            )));
        }
        Ok(())
    }
}
