//! Core ledger functionality
//!
//! Blocks and their headers, transactions, the Merkle commitment, the
//! proof-of-work sealer and the ledger that ties them together.

pub mod block;
pub mod blockchain;
pub mod merkle;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockHeader, BLOCK_VERSION};
pub use blockchain::{Blockchain, BlockchainIterator};
pub use merkle::{MerkleProof, MerkleTree, ProofElement};
pub use proof_of_work::ProofOfWork;
pub use transaction::{TXInput, TXOutput, Transaction, COINBASE_VOUT};
