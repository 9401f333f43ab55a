//! Configuration management for the dilemma arena client

use std::fs;
use std::path::Path;

use dilemma_logic::StrategyId;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ledger::codec::UNITS_PER_TOKEN;
use crate::ledger::Address;
use crate::opponent::Tone;
use crate::workflow::OpponentMode;

/// Main configuration for the arena client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Ledger network and explorer
    pub network: NetworkConfig,
    /// Stakes and the opponent
    pub game: GameConfig,
    /// Narrated advice
    pub advice: AdviceConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Network-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network label used in explorer links
    pub label: String,
    /// Block explorer base url, without trailing slash
    pub explorer_base_url: String,
    /// Deployed game contract
    pub contract_id: String,
    /// Fixed identity the algorithmic opponent plays under
    pub counterparty: Address,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            label: "testnet".to_string(),
            explorer_base_url: "https://stellar.expert/explorer".to_string(),
            contract_id: String::new(),
            counterparty: Address::new("arena-house"),
        }
    }
}

impl NetworkConfig {
    /// Explorer page for a transaction
    pub fn transaction_link(&self, tx_hash: &str) -> String {
        format!("{}/{}/tx/{}", self.base_url(), self.label, tx_hash)
    }

    /// Explorer page for the game contract, if one is configured
    pub fn contract_link(&self) -> Option<String> {
        if self.contract_id.is_empty() {
            return None;
        }
        Some(format!("{}/{}/contract/{}", self.base_url(), self.label, self.contract_id))
    }

    fn base_url(&self) -> &str {
        self.explorer_base_url.trim_end_matches('/')
    }
}

/// How the second party is played
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpponentKind {
    /// A catalog strategy moves under the counterparty identity
    #[default]
    Algorithmic,
    /// Two local players share one workflow
    HotSeat,
}

/// Game-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Stake used when the caller gives none, in ledger units
    pub default_stake: u64,
    /// Largest stake accepted, in ledger units
    pub max_stake: u64,
    pub opponent_strategy: StrategyId,
    pub tone: Tone,
    pub opponent_mode: OpponentKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_stake: UNITS_PER_TOKEN,
            max_stake: 1_000 * UNITS_PER_TOKEN,
            opponent_strategy: StrategyId::TitForTat,
            tone: Tone::Casual,
            opponent_mode: OpponentKind::Algorithmic,
        }
    }
}

impl GameConfig {
    pub fn opponent_mode(&self) -> OpponentMode {
        match self.opponent_mode {
            OpponentKind::Algorithmic => OpponentMode::Algorithmic {
                strategy: self.opponent_strategy,
                tone: self.tone,
            },
            OpponentKind::HotSeat => OpponentMode::HotSeat,
        }
    }
}

/// Narrated advice configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    /// Key for the advice service; without one advice is unavailable
    pub api_key: Option<String>,
    pub persona: String,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            persona: "nash".to_string(),
        }
    }
}

impl AdviceConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl ArenaConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::new("config_file", format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ArenaConfig = toml::from_str(content)
            .map_err(|e| ConfigError::new("config_format", format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new("config_serialization", format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::new("config_write", format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.label.trim().is_empty() {
            return Err(ConfigError::new("network.label", "Network label must not be empty"));
        }

        if self.network.counterparty.is_empty() {
            return Err(ConfigError::new("network.counterparty", "Counterparty address must not be empty"));
        }

        if self.game.default_stake == 0 {
            return Err(ConfigError::new("game.default_stake", "Default stake must be greater than 0"));
        }

        if self.game.default_stake > self.game.max_stake {
            return Err(ConfigError::new("game.stakes", "Default stake must not exceed max stake"));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::new("logging.filter", "Log filter must not be empty"));
        }

        Ok(())
    }
}
