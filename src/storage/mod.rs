//! Chain-derived state
//!
//! The ledger keeps no index of unspent outputs; this module answers those
//! queries by walking the chain, with an optional per-address cache.

pub mod utxo_set;

pub use utxo_set::{CachedUTXOSet, UTXOSet, UtxoSource, UTXO};
