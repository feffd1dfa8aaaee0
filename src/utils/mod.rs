//! Utility functions and helpers
//!
//! This module contains the hashing, signing, encoding and timestamp helpers
//! used throughout the ledger.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, double_sha256_digest,
    ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify, new_key_pair,
    public_key_coordinates, ripemd160_digest, sha256_digest,
};

pub use serialization::{deserialize, serialize};
