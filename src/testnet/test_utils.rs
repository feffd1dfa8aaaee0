//! Test utilities for ledger testing

use crate::config::Config;
use crate::core::Transaction;
use crate::error::Result;
use crate::storage::{UtxoSource, UTXO};
use crate::wallet::{address_to_pub_key_hash, Wallets};

/// Low enough that sealing a block takes a handful of hashes.
pub const TEST_DIFFICULTY: u32 = 4;

pub fn test_config() -> Config {
    Config {
        difficulty: TEST_DIFFICULTY,
        ..Config::default()
    }
}

/// Registry with `count` fresh keys, and their addresses in creation order.
pub fn test_wallets(count: usize) -> (Wallets, Vec<String>) {
    let mut wallets = Wallets::new();
    let addresses = (0..count)
        .map(|_| wallets.create_wallet().unwrap())
        .collect();
    (wallets, addresses)
}

/// Fixed unspent set for exercising the transaction engine without a chain.
pub struct StaticUtxos {
    utxos: Vec<UTXO>,
}

impl StaticUtxos {
    /// Every output of `transactions` locked to `address`, treated as unspent.
    pub fn from_transactions(address: &str, transactions: &[Transaction]) -> StaticUtxos {
        let pub_key_hash = address_to_pub_key_hash(address).unwrap();
        let mut utxos = vec![];
        for tx in transactions {
            let txid = tx.hash().unwrap();
            for (idx, out) in tx.get_vout().iter().enumerate() {
                if out.is_locked_with_key(&pub_key_hash) {
                    utxos.push(UTXO::new(txid.clone(), idx, out.clone()));
                }
            }
        }
        StaticUtxos { utxos }
    }
}

impl UtxoSource for StaticUtxos {
    fn find_utxos(&self, address: &str) -> Result<(Vec<UTXO>, u64)> {
        let pub_key_hash = address_to_pub_key_hash(address)?;
        let utxos: Vec<UTXO> = self
            .utxos
            .iter()
            .filter(|utxo| utxo.get_output().is_locked_with_key(&pub_key_hash))
            .cloned()
            .collect();
        let total = utxos.iter().map(|utxo| utxo.get_output().get_value()).sum();
        Ok((utxos, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_wallets() {
        let (wallets, addresses) = test_wallets(5);
        assert_eq!(wallets.len(), 5);

        // All addresses should be unique
        for i in 0..addresses.len() {
            for j in i + 1..addresses.len() {
                assert_ne!(addresses[i], addresses[j]);
            }
            assert!(wallets.get_wallet(&addresses[i]).is_some());
        }
    }

    #[test]
    fn test_static_utxos_filter_by_owner() {
        let (_, addresses) = test_wallets(2);
        let coinbase = Transaction::new_coinbase_tx(&addresses[0], 7, "x").unwrap();
        let source = StaticUtxos::from_transactions(&addresses[0], &[coinbase]);

        assert_eq!(source.find_utxos(&addresses[0]).unwrap().1, 7);
        assert_eq!(source.find_utxos(&addresses[1]).unwrap(), (vec![], 0));
    }
}
