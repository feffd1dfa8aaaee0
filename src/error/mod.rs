//! Error handling for the ledger
//!
//! This module provides the error taxonomy for every ledger operation.
//! Validation failures carry enough context to tell which input broke.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Address failed Base58Check decoding or checksum validation
    AddressFormat(String),
    /// Spend exceeds the available unspent total
    InsufficientFunds { required: u64, available: u64 },
    /// An input does not reference an unspent output of its owner
    NotAnUnspentOutput { txid: String, vout: i64 },
    /// The input's public key does not hash to the output's locking hash
    LockMismatch { txid: String, vout: i64 },
    /// The input's signature does not verify under its public key
    BadSignature { txid: String, vout: i64 },
    /// Outputs claim more value than the inputs provide
    Overspend { inputs: u64, outputs: u64 },
    /// Sealing exhausted the nonce space
    NoNonceFound { difficulty: u32 },
    /// Merkle commitment requested over zero digests
    EmptyTransactionSet,
    /// A previous-hash pointer does not resolve to a stored block
    UnknownBlock(String),
    /// No ledger has been created yet
    ChainNotInitialized,
    /// Block structure or integrity errors
    InvalidBlock(String),
    /// Other transaction errors (value overflow, malformed input)
    Transaction(String),
    /// Mining interrupted or misconfigured
    Mining(String),
    /// Cryptographic operation errors
    Crypto(String),
    /// Key registry errors
    Wallet(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::AddressFormat(addr) => write!(f, "Invalid address: {addr}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::NotAnUnspentOutput { txid, vout } => {
                write!(f, "Input {txid}:{vout} is not an unspent output")
            }
            BlockchainError::LockMismatch { txid, vout } => {
                write!(f, "Public key does not unlock output {txid}:{vout}")
            }
            BlockchainError::BadSignature { txid, vout } => {
                write!(f, "Bad signature on input {txid}:{vout}")
            }
            BlockchainError::Overspend { inputs, outputs } => {
                write!(f, "Overspend: inputs {inputs} < outputs {outputs}")
            }
            BlockchainError::NoNonceFound { difficulty } => {
                write!(f, "No nonce found for difficulty {difficulty}")
            }
            BlockchainError::EmptyTransactionSet => {
                write!(f, "Cannot commit to an empty transaction set")
            }
            BlockchainError::UnknownBlock(hash) => write!(f, "Unknown block: {hash}"),
            BlockchainError::ChainNotInitialized => {
                write!(f, "No blockchain yet, create one first")
            }
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
