//! Configuration for the stakebook engine.
//!
//! Centralized settings with sensible defaults, TOML file loading,
//! environment variable overrides and validation. Monetary settings are
//! written in whole tokens so config files stay readable; helpers convert
//! to base units.

use crate::errors::{InputError, StakebookResult};
use crate::types::{Amount, Timestamp, ETHER};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Fee share denominator: shares are expressed in bips over 100 000
pub const FEE_DENOMINATOR: u64 = 100_000;

/// Top-level engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StakebookConfig {
    pub settlement: SettlementSettings,
    pub oracle: OracleSettings,
    pub storage: StorageSettings,
}

/// Fee waterfall shares for the pool settlement engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettlementSettings {
    /// Total fee taken from a winning pool's losing aggregate
    pub total_fee_bips: u64,
    /// Platform admin share
    pub platform_fee_bips: u64,
    /// Share paid to the game's bookie
    pub bookie_fee_bips: u64,
    /// Share paid to the winning team's token holder
    pub team_fee_bips: u64,
    /// Share paid to the winning market's token holder
    pub market_fee_bips: u64,
    /// Share paid to the winning bet's token holder
    pub bet_fee_bips: u64,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            total_fee_bips: 30_000,
            platform_fee_bips: 10_000,
            bookie_fee_bips: 5_000,
            team_fee_bips: 5_000,
            market_fee_bips: 5_000,
            bet_fee_bips: 5_000,
        }
    }
}

impl SettlementSettings {
    /// Winner share of the losing aggregate, after all fees
    pub fn winner_share_bips(&self) -> u64 {
        FEE_DENOMINATOR - self.total_fee_bips
    }
}

/// Quorum, reward and staking parameters for the result oracle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleSettings {
    /// Minimum total votes before any result can reach consensus
    pub min_votes: u32,
    /// Reward paid to the first agreeing voter, in whole tokens
    pub max_reward_per_validator: u64,
    /// Aggregate reward budget per game, in whole tokens
    pub max_total_reward_per_game: u64,
    /// Stake required to acquire the validator role, in whole tokens
    pub validator_stake: u64,
    /// Secondary bond per delegate, in whole tokens
    pub delegate_stake: u64,
    /// Cap on concurrent validators
    pub max_validators: u32,
    /// Cap on delegates per principal
    pub max_delegates: u32,
    /// Bookie-exclusive submission window after game end, in seconds
    pub grace_period_secs: Timestamp,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            min_votes: 12,
            max_reward_per_validator: 60,
            max_total_reward_per_game: 500,
            validator_stake: 10_000,
            delegate_stake: 100,
            max_validators: 10,
            max_delegates: 5,
            grace_period_secs: 10 * 60,
        }
    }
}

impl OracleSettings {
    pub fn max_reward_per_validator_units(&self) -> Amount {
        self.max_reward_per_validator as Amount * ETHER
    }

    pub fn max_total_reward_per_game_units(&self) -> Amount {
        self.max_total_reward_per_game as Amount * ETHER
    }

    pub fn validator_stake_units(&self) -> Amount {
        self.validator_stake as Amount * ETHER
    }

    pub fn delegate_stake_units(&self) -> Amount {
        self.delegate_stake as Amount * ETHER
    }
}

/// Settlement record store configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageSettings {
    pub data_dir: String,
    pub enabled: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "./stakebook_data".to_string(),
            enabled: true,
        }
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> StakebookResult<StakebookConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            StakebookConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> StakebookResult<StakebookConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InputError::InvalidInput(format!("Failed to read {}: {}", path, e))
        })?;

        toml::from_str(&content)
            .map_err(|e| InputError::InvalidInput(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut StakebookConfig) -> StakebookResult<()> {
        if let Ok(dir) = env::var("STAKEBOOK_DATA_DIR") {
            config.storage.data_dir = dir;
        }
        if let Ok(value) = env::var("STAKEBOOK_MIN_VOTES") {
            config.oracle.min_votes = value.parse().map_err(|_| {
                InputError::InvalidInput(format!("Invalid STAKEBOOK_MIN_VOTES: {}", value))
            })?;
        }
        if let Ok(value) = env::var("STAKEBOOK_GRACE_SECS") {
            config.oracle.grace_period_secs = value.parse().map_err(|_| {
                InputError::InvalidInput(format!("Invalid STAKEBOOK_GRACE_SECS: {}", value))
            })?;
        }
        if let Ok(value) = env::var("STAKEBOOK_MAX_VALIDATORS") {
            config.oracle.max_validators = value.parse().map_err(|_| {
                InputError::InvalidInput(format!("Invalid STAKEBOOK_MAX_VALIDATORS: {}", value))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &StakebookConfig) -> StakebookResult<()> {
        let fees = &config.settlement;
        let share_sum = fees.platform_fee_bips
            + fees.bookie_fee_bips
            + fees.team_fee_bips
            + fees.market_fee_bips
            + fees.bet_fee_bips;

        if share_sum != fees.total_fee_bips {
            return Err(InputError::InvalidInput(format!(
                "fee shares sum to {} bips but total_fee_bips is {}",
                share_sum, fees.total_fee_bips
            ))
            .into());
        }
        if fees.total_fee_bips >= FEE_DENOMINATOR {
            return Err(InputError::InvalidInput(
                "total fee leaves nothing for winners".to_string(),
            )
            .into());
        }

        let oracle = &config.oracle;
        if oracle.min_votes == 0 {
            return Err(InputError::InvalidInput("min_votes cannot be zero".to_string()).into());
        }
        if oracle.max_validators == 0 {
            return Err(
                InputError::InvalidInput("max_validators cannot be zero".to_string()).into(),
            );
        }
        if oracle.validator_stake == 0 {
            return Err(
                InputError::InvalidInput("validator_stake cannot be zero".to_string()).into(),
            );
        }
        if oracle.grace_period_secs < 0 {
            return Err(
                InputError::InvalidInput("grace_period_secs cannot be negative".to_string()).into(),
            );
        }

        if config.storage.enabled && config.storage.data_dir.is_empty() {
            return Err(InputError::InvalidInput("storage.data_dir is empty".to_string()).into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &StakebookConfig, path: &str) -> StakebookResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| InputError::InvalidInput(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| InputError::InvalidInput(format!("Failed to write {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> StakebookResult<()> {
    let config = StakebookConfig::default();
    ConfigLoader::new().save(&config, path)
}
