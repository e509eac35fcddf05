//! Configuration types for a Swapdesk engine instance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, Result, SwapdeskError};

/// Configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The engine's own ledger account. Sellers approve this account; it
    /// pulls both legs of every trade.
    pub engine_account: AccountId,
    /// Bootstrap holder of the Admin role.
    pub admin: AccountId,
    /// Optional bootstrap holder of the Moderator role.
    #[serde(default)]
    pub moderator: Option<AccountId>,
    /// Fee parameter in basis points. Stored and reported, not applied.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u16,
    /// Maximum element count of a batch call.
    #[serde(default = "default_max_batch_len")]
    pub max_batch_len: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_fee_bps() -> u16 {
    constants::DEFAULT_FEE_BPS
}

fn default_max_batch_len() -> usize {
    constants::DEFAULT_MAX_BATCH_LEN
}

impl EngineConfig {
    /// Config with defaults for everything but the two required accounts.
    #[must_use]
    pub fn new(engine_account: AccountId, admin: AccountId) -> Self {
        Self {
            engine_account,
            admin,
            moderator: None,
            fee_bps: constants::DEFAULT_FEE_BPS,
            max_batch_len: constants::DEFAULT_MAX_BATCH_LEN,
            logging: LoggingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_moderator(mut self, moderator: AccountId) -> Self {
        self.moderator = Some(moderator);
        self
    }

    /// Parse JSON and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SwapdeskError::Configuration(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file and validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SwapdeskError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_len == 0 {
            return Err(SwapdeskError::Configuration(
                "max_batch_len must be at least 1".into(),
            ));
        }
        if self.fee_bps > constants::MAX_FEE_BPS {
            return Err(SwapdeskError::Configuration(format!(
                "fee_bps {} exceeds {}",
                self.fee_bps,
                constants::MAX_FEE_BPS
            )));
        }
        if self.engine_account.is_zero() || self.admin.is_zero() {
            return Err(SwapdeskError::Configuration(
                "engine_account and admin must be non-zero".into(),
            ));
        }
        if self.admin == self.engine_account {
            return Err(SwapdeskError::Configuration(
                "admin must differ from engine_account".into(),
            ));
        }
        Ok(())
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    constants::DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Pretty,
        }
    }
}
