//! Key management, address codec and signing
//!
//! The ledger core only sees these through [`Signer`], [`verify_signature`]
//! and the address helpers; [`Wallets`] is the in-memory key registry the
//! command surface uses.

pub mod signer;
#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use signer::{verify_signature, Signature, Signer};
pub use wallet::{
    address_from_pub_key, address_to_pub_key_hash, convert_address, hash_pub_key,
    validate_address, Wallet, ADDRESS_CHECK_SUM_LEN,
};
pub use wallets::Wallets;
