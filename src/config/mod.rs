//! Configuration management
//!
//! Ledger parameters (difficulty, rewards, coinbase notes, nonce cap) with
//! defaults, TOML loading and environment overrides.

pub mod settings;

pub use settings::{
    Config, DEFAULT_BLOCK_REWARD, DEFAULT_DIFFICULTY, DEFAULT_GENESIS_NOTE, DEFAULT_MINER_NOTE,
    MAX_DIFFICULTY,
};
