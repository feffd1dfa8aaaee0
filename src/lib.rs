//! # UTXO Ledger - My Single-Node Ledger Engine
//!
//! This is the ledger core I pulled out of my blockchain work: one process,
//! one chain, everything in memory. When I come back to this code, here's what
//! I need to remember:
//!
//! ## What It Does
//! - **Transactions**: UTXO model with pay-to-pubkey-hash locks, ECDSA P-256
//!   signatures and double SHA-256 transaction ids
//! - **Blocks**: Merkle-committed transactions under a proof-of-work header
//! - **Ledger**: blocks keyed by header hash, a head pointer, all-or-nothing
//!   appends and a full integrity check
//! - **Unspent outputs**: derived by walking the chain, with an opt-in cache
//!
//! ## How I Organized My Code
//! - `core/`: blocks, transactions, Merkle trees, sealing and the ledger itself
//! - `storage/`: unspent-output queries over the chain
//! - `wallet/`: keys, addresses and the signing seam
//! - `config/`: difficulty, rewards and coinbase notes
//! - `utils/`: hashing, encoding and canonical serialization
//! - `cli/`: argument parsing, the shell grammar and the session that runs it
//!
//! ## Key Design Decisions I Made
//! - The ledger is a plain value passed around, never a global
//! - Sealing takes an unsealed header and hands back a sealed copy
//! - Nothing is indexed: rescanning is the baseline, caching is opt-in
//! - Value left over when inputs exceed outputs is burned, not paid as a fee

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, Session, ShellCommand};
pub use config::Config;
pub use core::{
    Block, BlockHeader, Blockchain, BlockchainIterator, MerkleProof, MerkleTree, ProofOfWork,
    TXInput, TXOutput, Transaction,
};
pub use error::{BlockchainError, Result};
pub use storage::{CachedUTXOSet, UTXOSet, UtxoSource, UTXO};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, double_sha256_digest,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    ripemd160_digest, sha256_digest,
};
pub use wallet::{
    address_from_pub_key, address_to_pub_key_hash, convert_address, hash_pub_key,
    validate_address, verify_signature, Signature, Signer, Wallet, Wallets,
    ADDRESS_CHECK_SUM_LEN,
};
