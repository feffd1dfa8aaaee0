// Unspent-output queries derived from the chain.
// Nothing is indexed: every query walks the chain from the head, optionally
// preceded by transactions that are waiting to be mined.

use crate::core::{Blockchain, TXInput, TXOutput, Transaction};
use crate::error::{BlockchainError, Result};
use crate::wallet::address_to_pub_key_hash;
use data_encoding::HEXLOWER;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;

/// An output that no later transaction consumes, with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UTXO {
    txid: Vec<u8>,
    vout: usize,
    output: TXOutput,
}

impl UTXO {
    pub fn new(txid: Vec<u8>, vout: usize, output: TXOutput) -> UTXO {
        UTXO { txid, vout, output }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_txid_hex(&self) -> String {
        HEXLOWER.encode(&self.txid)
    }

    pub fn get_vout(&self) -> usize {
        self.vout
    }

    pub fn get_output(&self) -> &TXOutput {
        &self.output
    }

    /// True when `input` references this output.
    pub fn matches_input(&self, input: &TXInput) -> bool {
        input.get_txid() == Some(self.txid.as_slice()) && input.get_vout() == self.vout as i64
    }
}

/// Anything that can answer "what may this address spend right now".
pub trait UtxoSource {
    /// Unspent outputs locked to `address` and their total value.
    fn find_utxos(&self, address: &str) -> Result<(Vec<UTXO>, u64)>;
}

// Accumulates one address's unspent outputs while transactions are visited
// newest first. Spends are counted per reference so identical outputs stay
// distinguishable.
struct Scan<'k> {
    pub_key_hash: &'k [u8],
    spent: HashMap<(Vec<u8>, i64), usize>,
    utxos: Vec<UTXO>,
    total: u64,
}

impl<'k> Scan<'k> {
    fn new(pub_key_hash: &'k [u8]) -> Scan<'k> {
        Scan {
            pub_key_hash,
            spent: HashMap::new(),
            utxos: vec![],
            total: 0,
        }
    }

    fn visit(&mut self, tx: &Transaction) -> Result<()> {
        let txid = tx.hash()?;
        for (idx, out) in tx.get_vout().iter().enumerate() {
            if let Some(count) = self.spent.get_mut(&(txid.clone(), idx as i64)) {
                if *count > 0 {
                    *count -= 1;
                    continue;
                }
            }
            if out.is_locked_with_key(self.pub_key_hash) {
                self.total = self.total.checked_add(out.get_value()).ok_or_else(|| {
                    BlockchainError::Transaction("Unspent value overflow".to_string())
                })?;
                self.utxos.push(UTXO::new(txid.clone(), idx, out.clone()));
            }
        }

        if tx.is_coinbase() {
            return Ok(());
        }
        for vin in tx.get_vin() {
            if let Some(spent_txid) = vin.get_txid() {
                *self
                    .spent
                    .entry((spent_txid.to_vec(), vin.get_vout()))
                    .or_insert(0) += 1;
            }
        }
        Ok(())
    }

    fn finish(self) -> (Vec<UTXO>, u64) {
        (self.utxos, self.total)
    }
}

/// Recomputes the unspent set from the chain on every query.
///
/// Transactions in `pending` are treated as one more block above the head, in
/// the order given, so a batch can be checked before it is sealed.
pub struct UTXOSet<'a> {
    blockchain: &'a Blockchain,
    pending: &'a [Transaction],
}

impl<'a> UTXOSet<'a> {
    pub fn new(blockchain: &'a Blockchain) -> UTXOSet<'a> {
        UTXOSet {
            blockchain,
            pending: &[],
        }
    }

    pub fn with_pending(blockchain: &'a Blockchain, pending: &'a [Transaction]) -> UTXOSet<'a> {
        UTXOSet {
            blockchain,
            pending,
        }
    }

    pub fn find_utxos_by_hash(&self, pub_key_hash: &[u8]) -> Result<(Vec<UTXO>, u64)> {
        let mut scan = Scan::new(pub_key_hash);
        for tx in self.pending.iter().rev() {
            scan.visit(tx)?;
        }
        for block in self.blockchain.iterator() {
            for tx in block?.get_transactions().iter().rev() {
                scan.visit(tx)?;
            }
        }
        Ok(scan.finish())
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        let (_, balance) = self.find_utxos(address)?;
        Ok(balance)
    }

    /// Number of unspent outputs locked to `address`.
    pub fn count_utxos(&self, address: &str) -> Result<usize> {
        let (utxos, _) = self.find_utxos(address)?;
        Ok(utxos.len())
    }
}

impl UtxoSource for UTXOSet<'_> {
    fn find_utxos(&self, address: &str) -> Result<(Vec<UTXO>, u64)> {
        let pub_key_hash = address_to_pub_key_hash(address)?;
        self.find_utxos_by_hash(&pub_key_hash)
    }
}

/// Memoises per-address answers over a chain that it borrows immutably.
///
/// The borrow keeps the chain from growing while the cache is alive, so an
/// entry can never describe an older head.
pub struct CachedUTXOSet<'a> {
    inner: UTXOSet<'a>,
    cache: RefCell<HashMap<String, (Vec<UTXO>, u64)>>,
}

impl<'a> CachedUTXOSet<'a> {
    pub fn new(blockchain: &'a Blockchain) -> CachedUTXOSet<'a> {
        CachedUTXOSet {
            inner: UTXOSet::new(blockchain),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_addresses(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl UtxoSource for CachedUTXOSet<'_> {
    fn find_utxos(&self, address: &str) -> Result<(Vec<UTXO>, u64)> {
        if let Some(hit) = self.cache.borrow().get(address) {
            return Ok(hit.clone());
        }
        debug!("UTXO cache miss for {address}");
        let found = self.inner.find_utxos(address)?;
        self.cache
            .borrow_mut()
            .insert(address.to_string(), found.clone());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{test_config, test_wallets};
    use crate::wallet::Signer;

    #[test]
    fn test_genesis_reward_is_unspent() {
        let (wallets, addresses) = test_wallets(1);
        let chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        let utxo_set = UTXOSet::new(&chain);

        let (utxos, total) = utxo_set.find_utxos(&addresses[0]).unwrap();
        assert_eq!(total, 50);
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].get_vout(), 0);
        assert!(utxos[0]
            .get_output()
            .is_locked_with_key(&crate::wallet::hash_pub_key(
                wallets.get_wallet(&addresses[0]).unwrap().public_key()
            )));
    }

    #[test]
    fn test_queries_are_idempotent_and_ordered() {
        let (wallets, addresses) = test_wallets(2);
        let mut chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        let signer = wallets.get_wallet(&addresses[0]).unwrap();
        let tx = Transaction::new_utxo_transaction(
            &addresses[0],
            &addresses[1],
            20,
            &UTXOSet::new(&chain),
            signer,
        )
        .unwrap();
        chain.add_block(&[tx], &addresses[1], "m").unwrap();

        let utxo_set = UTXOSet::new(&chain);
        let first = utxo_set.find_utxos(&addresses[1]).unwrap();
        let second = utxo_set.find_utxos(&addresses[1]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.1, 70);
        assert_eq!(utxo_set.get_balance(&addresses[0]).unwrap(), 30);
    }

    #[test]
    fn test_pending_transactions_shadow_the_chain() {
        let (wallets, addresses) = test_wallets(2);
        let chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        let signer = wallets.get_wallet(&addresses[0]).unwrap();
        let tx = Transaction::new_utxo_transaction(
            &addresses[0],
            &addresses[1],
            15,
            &UTXOSet::new(&chain),
            signer,
        )
        .unwrap();

        let pending = [tx];
        let view = UTXOSet::with_pending(&chain, &pending);
        assert_eq!(view.get_balance(&addresses[0]).unwrap(), 35);
        assert_eq!(view.get_balance(&addresses[1]).unwrap(), 15);
        assert_eq!(UTXOSet::new(&chain).get_balance(&addresses[0]).unwrap(), 50);
    }

    #[test]
    fn test_unknown_address_has_nothing() {
        let (_, addresses) = test_wallets(2);
        let chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        let utxo_set = UTXOSet::new(&chain);
        assert_eq!(utxo_set.find_utxos(&addresses[1]).unwrap(), (vec![], 0));
        assert_eq!(utxo_set.count_utxos(&addresses[1]).unwrap(), 0);
    }

    #[test]
    fn test_malformed_address_is_rejected() {
        let (_, addresses) = test_wallets(1);
        let chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        assert!(matches!(
            UTXOSet::new(&chain).find_utxos("0OIl"),
            Err(BlockchainError::AddressFormat(_))
        ));
    }

    #[test]
    fn test_cache_matches_uncached_answers() {
        let (_, addresses) = test_wallets(2);
        let chain = Blockchain::create_blockchain(&addresses[0], test_config()).unwrap();
        let cached = CachedUTXOSet::new(&chain);
        let plain = UTXOSet::new(&chain);

        for address in &addresses {
            assert_eq!(
                cached.find_utxos(address).unwrap(),
                plain.find_utxos(address).unwrap()
            );
            assert_eq!(
                cached.find_utxos(address).unwrap(),
                plain.find_utxos(address).unwrap()
            );
        }
        assert_eq!(cached.cached_addresses(), 2);
    }
}
