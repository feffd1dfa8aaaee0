use crate::core::{MerkleProof, MerkleTree, ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, sha256_digest};
use data_encoding::HEXLOWER;
use log::info;
use serde::{Deserialize, Serialize};

pub const BLOCK_VERSION: u32 = 0;

/// Fixed-field block header. The block's identity is the SHA-256 of these
/// fields; transactions are only bound in through the Merkle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    version: u32,
    pre_block_hash: Option<Vec<u8>>,
    merkle_root: Vec<u8>,
    timestamp: i64,
    difficulty: u32,
    nonce: u64,
}

impl BlockHeader {
    /// Unsealed header stamped with the current time and a zero nonce.
    pub fn new(
        pre_block_hash: Option<Vec<u8>>,
        merkle_root: Vec<u8>,
        difficulty: u32,
    ) -> Result<BlockHeader> {
        Ok(BlockHeader {
            version: BLOCK_VERSION,
            pre_block_hash,
            merkle_root,
            timestamp: current_timestamp()?,
            difficulty,
            nonce: 0,
        })
    }

    pub(crate) fn with_nonce(&self, nonce: u64) -> BlockHeader {
        BlockHeader {
            nonce,
            ..self.clone()
        }
    }

    fn prepare_data(&self) -> Vec<u8> {
        let mut data_bytes = vec![];
        data_bytes.extend(self.version.to_be_bytes());
        // Genesis contributes no bytes for the missing previous hash
        if let Some(pre_block_hash) = &self.pre_block_hash {
            data_bytes.extend(pre_block_hash);
        }
        data_bytes.extend(&self.merkle_root);
        data_bytes.extend(self.timestamp.to_be_bytes());
        data_bytes.extend(self.difficulty.to_be_bytes());
        data_bytes.extend(self.nonce.to_be_bytes());
        data_bytes
    }

    pub fn hash(&self) -> Vec<u8> {
        sha256_digest(&self.prepare_data())
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn get_pre_block_hash(&self) -> Option<&[u8]> {
        self.pre_block_hash.as_deref()
    }

    pub fn get_merkle_root(&self) -> &[u8] {
        &self.merkle_root
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new_block(
        pre_block_hash: Option<Vec<u8>>,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Result<Block> {
        Self::new_block_with(pre_block_hash, transactions, difficulty, |pow| pow.run())
    }

    /// Builds the header and hands the prepared proof-of-work to `seal`, which
    /// may tune it (nonce cap, cancellation) before running it.
    pub fn new_block_with<'a, F>(
        pre_block_hash: Option<Vec<u8>>,
        transactions: Vec<Transaction>,
        difficulty: u32,
        seal: F,
    ) -> Result<Block>
    where
        F: FnOnce(ProofOfWork<'a>) -> Result<BlockHeader>,
    {
        let merkle_root = Self::calculate_merkle_root(&transactions)?;
        let header = BlockHeader::new(pre_block_hash, merkle_root, difficulty)?;

        info!(
            "Starting proof-of-work for block with {} transactions (difficulty {difficulty})",
            transactions.len()
        );
        let header = seal(ProofOfWork::new_proof_of_work(header))?;

        Ok(Block {
            header,
            transactions,
        })
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_hash(&self) -> Vec<u8> {
        self.header.hash()
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.get_hash())
    }

    pub fn get_pre_block_hash(&self) -> Option<&[u8]> {
        self.header.get_pre_block_hash()
    }

    pub fn is_genesis(&self) -> bool {
        self.header.pre_block_hash.is_none()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_merkle_root(&self) -> &[u8] {
        self.header.get_merkle_root()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.header.get_timestamp()
    }

    pub fn get_difficulty(&self) -> u32 {
        self.header.get_difficulty()
    }

    pub fn get_nonce(&self) -> u64 {
        self.header.get_nonce()
    }

    /// Free-form data the miner put in the coinbase input.
    pub fn get_miner_note(&self) -> Option<String> {
        self.transactions
            .first()
            .filter(|tx| tx.is_coinbase())
            .and_then(|tx| tx.get_vin().first())
            .map(|input| String::from_utf8_lossy(input.get_pub_key()).into_owned())
    }

    fn transaction_hashes(transactions: &[Transaction]) -> Result<Vec<Vec<u8>>> {
        transactions.iter().map(Transaction::hash).collect()
    }

    /// Calculate Merkle root for a list of transactions
    fn calculate_merkle_root(transactions: &[Transaction]) -> Result<Vec<u8>> {
        MerkleTree::calculate_merkle_root(&Self::transaction_hashes(transactions)?)
    }

    /// Verify that the block's Merkle root matches its transactions
    pub fn verify_merkle_root(&self) -> Result<bool> {
        let calculated_root = Self::calculate_merkle_root(&self.transactions)?;
        Ok(calculated_root == self.header.merkle_root)
    }

    /// Generate a Merkle proof for a transaction in this block
    pub fn generate_merkle_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        if transaction_index >= self.transactions.len() {
            return Err(BlockchainError::InvalidBlock(format!(
                "Transaction index {} out of bounds (transactions: {})",
                transaction_index,
                self.transactions.len()
            )));
        }

        let merkle_tree = MerkleTree::from_hashes(&Self::transaction_hashes(&self.transactions)?)?;
        merkle_tree.generate_proof(transaction_index)
    }

    /// Verify a Merkle proof against this block's Merkle root
    pub fn verify_merkle_proof(&self, proof: &MerkleProof) -> bool {
        proof.merkle_root == self.header.merkle_root && MerkleTree::verify_proof(proof)
    }
}
