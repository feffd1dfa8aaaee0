use crate::error::{BlockchainError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_DIFFICULTY: u32 = 8;
pub const MAX_DIFFICULTY: u32 = 256;
pub const DEFAULT_BLOCK_REWARD: u64 = 50;
pub const DEFAULT_GENESIS_NOTE: &str = "Genesis Block";
pub const DEFAULT_MINER_NOTE: &str = "Block reward";

const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const BLOCK_REWARD_KEY: &str = "LEDGER_BLOCK_REWARD";

/// Ledger parameters. Every field has a default, so a TOML file only needs to
/// name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Leading zero bits required of a block header digest.
    pub difficulty: u32,
    /// Value of the coinbase output in every mined block.
    pub block_reward: u64,
    pub genesis_note: String,
    pub miner_note: String,
    /// Highest nonce tried before sealing gives up; unbounded when absent.
    pub max_nonce: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DEFAULT_DIFFICULTY,
            block_reward: DEFAULT_BLOCK_REWARD,
            genesis_note: DEFAULT_GENESIS_NOTE.to_string(),
            miner_note: DEFAULT_MINER_NOTE.to_string(),
            max_nonce: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config> {
        info!("Loading configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Applies `LEDGER_DIFFICULTY` and `LEDGER_BLOCK_REWARD` from the process
    /// environment.
    pub fn apply_env(self) -> Result<Config> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_KEY) {
            self.difficulty = parse_override(DIFFICULTY_KEY, &value)?;
        }
        if let Some(value) = lookup(BLOCK_REWARD_KEY) {
            self.block_reward = parse_override(BLOCK_REWARD_KEY, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "Difficulty {} exceeds the maximum of {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BlockchainError::Config(format!("Invalid value for {key}: {value}")))
}
