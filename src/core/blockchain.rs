// The ledger: an in-memory map of sealed blocks keyed by header digest plus
// the hash of the current head. Blocks only ever enter through add_block,
// which validates the whole pending batch before anything is sealed or stored.

use crate::config::Config;
use crate::core::{Block, BlockHeader, ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use data_encoding::HEXLOWER;
use log::{info, warn};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;

pub struct Blockchain {
    blocks: HashMap<Vec<u8>, Block>,
    tip_hash: Option<Vec<u8>>,
    config: Config,
}

impl Blockchain {
    /// Empty ledger; the first appended block becomes its genesis.
    pub fn new(config: Config) -> Result<Blockchain> {
        config.validate()?;
        Ok(Blockchain {
            blocks: HashMap::new(),
            tip_hash: None,
            config,
        })
    }

    /// Ledger holding a genesis block that pays the configured reward to
    /// `genesis_address`.
    pub fn create_blockchain(genesis_address: &str, config: Config) -> Result<Blockchain> {
        let mut blockchain = Self::new(config)?;
        let note = blockchain.config.genesis_note.clone();
        info!("Creating genesis block for address: {genesis_address}");
        blockchain.add_block(&[], genesis_address, &note)?;
        Ok(blockchain)
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_tip_hash(&self) -> Option<&[u8]> {
        self.tip_hash.as_deref()
    }

    pub fn get_tip(&self) -> Option<&Block> {
        self.tip_hash
            .as_ref()
            .and_then(|tip_hash| self.blocks.get(tip_hash))
    }

    pub fn get_block(&self, block_hash: &[u8]) -> Option<&Block> {
        self.blocks.get(block_hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks from the head back to genesis.
    pub fn iterator(&self) -> BlockchainIterator<'_> {
        BlockchainIterator {
            blocks: &self.blocks,
            current_hash: self.tip_hash.as_deref(),
        }
    }

    /// Visits blocks head to genesis until `visitor` breaks.
    pub fn traverse<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Block) -> Result<ControlFlow<()>>,
    {
        for block in self.iterator() {
            if visitor(block?)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    pub fn find_transaction(&self, txid: &[u8]) -> Result<Option<&Transaction>> {
        for block in self.iterator() {
            for transaction in block?.get_transactions() {
                if transaction.hash()? == txid {
                    return Ok(Some(transaction));
                }
            }
        }
        Ok(None)
    }

    pub fn validate_transaction(&self, transaction: &Transaction) -> Result<()> {
        transaction.validate(&UTXOSet::new(self))
    }

    /// Validates a pending batch in order. Each transaction sees the chain
    /// plus every transaction before it in the batch.
    pub fn validate_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        for (i, transaction) in transactions.iter().enumerate() {
            let utxo_set = UTXOSet::with_pending(self, &transactions[..i]);
            if let Err(e) = transaction.validate(&utxo_set) {
                warn!("Rejecting pending transaction {i}: {e}");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Seals `transactions` behind a coinbase paying `miner_address` and makes
    /// the result the new head. Nothing changes if any step fails.
    pub fn add_block(
        &mut self,
        transactions: &[Transaction],
        miner_address: &str,
        miner_note: &str,
    ) -> Result<Block> {
        self.append(transactions, miner_address, miner_note, None)
    }

    /// Like [`Blockchain::add_block`], but sealing stops once `cancel` is set.
    pub fn add_block_cancellable(
        &mut self,
        transactions: &[Transaction],
        miner_address: &str,
        miner_note: &str,
        cancel: &AtomicBool,
    ) -> Result<Block> {
        self.append(transactions, miner_address, miner_note, Some(cancel))
    }

    fn append(
        &mut self,
        transactions: &[Transaction],
        miner_address: &str,
        miner_note: &str,
        cancel: Option<&AtomicBool>,
    ) -> Result<Block> {
        self.validate_transactions(transactions)?;

        let coinbase =
            Transaction::new_coinbase_tx(miner_address, self.config.block_reward, miner_note)?;
        let mut block_transactions = Vec::with_capacity(transactions.len() + 1);
        block_transactions.push(coinbase);
        block_transactions.extend_from_slice(transactions);

        let max_nonce = self.config.max_nonce;
        let block = Block::new_block_with(
            self.tip_hash.clone(),
            block_transactions,
            self.config.difficulty,
            |pow| Self::seal(pow, max_nonce, cancel),
        )?;

        let block_hash = block.get_hash();
        self.blocks.insert(block_hash.clone(), block.clone());
        self.tip_hash = Some(block_hash);
        info!(
            "Appended block {} with {} transactions (height {})",
            block.get_hash_hex(),
            block.get_transactions().len(),
            self.blocks.len() - 1
        );
        Ok(block)
    }

    fn seal<'a>(
        pow: ProofOfWork<'a>,
        max_nonce: Option<u64>,
        cancel: Option<&'a AtomicBool>,
    ) -> Result<BlockHeader> {
        let pow = match max_nonce {
            Some(cap) => pow.with_max_nonce(cap),
            None => pow,
        };
        match cancel {
            Some(flag) => pow.with_cancel_flag(flag).run(),
            None => pow.run(),
        }
    }

    /// Re-checks the integrity of every stored block and of the chain of links
    /// from the head back to a single genesis.
    pub fn validate_chain(&self) -> Result<()> {
        for (key, block) in &self.blocks {
            if block.get_hash() != *key {
                return Err(BlockchainError::InvalidBlock(format!(
                    "Block stored under {} hashes to {}",
                    HEXLOWER.encode(key),
                    block.get_hash_hex()
                )));
            }
        }

        let mut reached = 0;
        for block in self.iterator() {
            let block = block?;
            reached += 1;
            if reached > self.blocks.len() {
                return Err(BlockchainError::InvalidBlock(
                    "Previous-hash links form a cycle".to_string(),
                ));
            }

            let hash = block.get_hash_hex();
            if !ProofOfWork::validate(block.get_header()) {
                return Err(BlockchainError::InvalidBlock(format!(
                    "Block {hash} does not meet its difficulty target"
                )));
            }
            if !block.verify_merkle_root()? {
                return Err(BlockchainError::InvalidBlock(format!(
                    "Block {hash} has a stale Merkle root"
                )));
            }
            if !block.get_transactions().first().is_some_and(Transaction::is_coinbase) {
                return Err(BlockchainError::InvalidBlock(format!(
                    "Block {hash} does not start with a coinbase"
                )));
            }
        }

        if reached != self.blocks.len() {
            return Err(BlockchainError::InvalidBlock(format!(
                "{} stored blocks are not reachable from the head",
                self.blocks.len() - reached
            )));
        }
        info!("Validated chain of {reached} blocks");
        Ok(())
    }
}

pub struct BlockchainIterator<'a> {
    blocks: &'a HashMap<Vec<u8>, Block>,
    current_hash: Option<&'a [u8]>,
}

impl<'a> Iterator for BlockchainIterator<'a> {
    type Item = Result<&'a Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current_hash.take()?;
        match self.blocks.get(hash) {
            Some(block) => {
                self.current_hash = block.get_pre_block_hash();
                Some(Ok(block))
            }
            None => Some(Err(BlockchainError::UnknownBlock(HEXLOWER.encode(hash)))),
        }
    }
}
