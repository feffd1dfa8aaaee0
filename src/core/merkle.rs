use crate::error::{BlockchainError, Result};
use crate::utils::double_sha256_digest;
use serde::{Deserialize, Serialize};

/// Merkle tree over an ordered list of transaction digests.
///
/// Levels are built bottom-up by hashing adjacent pairs; an odd level pairs
/// its last digest with itself. Every level is kept so inclusion proofs can be
/// produced for any leaf.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds only the root.
    levels: Vec<Vec<Vec<u8>>>,
}

/// Merkle proof for transaction verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Transaction hash being proven
    pub transaction_hash: Vec<u8>,
    /// Merkle root hash
    pub merkle_root: Vec<u8>,
    /// Proof path (sibling hashes and directions), leaf level first
    pub proof_path: Vec<ProofElement>,
    /// Index of the transaction in the block
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofElement {
    /// Sibling hash
    pub hash: Vec<u8>,
    /// Direction: true if sibling is on the right, false if on the left
    pub is_right: bool,
}

impl MerkleTree {
    /// Create a Merkle tree from transaction hashes
    pub fn from_hashes(hashes: &[Vec<u8>]) -> Result<Self> {
        if hashes.is_empty() {
            return Err(BlockchainError::EmptyTransactionSet);
        }

        let mut levels = vec![hashes.to_vec()];
        while let Some(current_level) = levels.last() {
            if current_level.len() == 1 {
                break;
            }
            let next_level = current_level
                .chunks(2)
                .map(|pair| {
                    // Duplicate the last hash if odd number
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    Self::hash_pair(&pair[0], right)
                })
                .collect();
            levels.push(next_level);
        }

        Ok(MerkleTree { levels })
    }

    /// Get the Merkle root hash
    pub fn get_root_hash(&self) -> &[u8] {
        // from_hashes guarantees at least one level with exactly one root
        self.levels
            .last()
            .and_then(|level| level.first())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Get the number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Generate a Merkle proof for a transaction at the given index
    pub fn generate_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if transaction_index >= leaf_count {
            return Err(BlockchainError::InvalidBlock(format!(
                "Transaction index {transaction_index} out of bounds (leaves: {leaf_count})"
            )));
        }

        let mut proof_path = Vec::new();
        let mut index = transaction_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = index % 2 == 0;
            let sibling_index = if is_right { index + 1 } else { index - 1 };
            let sibling = level.get(sibling_index).unwrap_or(&level[index]);
            proof_path.push(ProofElement {
                hash: sibling.clone(),
                is_right,
            });
            index /= 2;
        }

        Ok(MerkleProof {
            transaction_hash: self.levels[0][transaction_index].clone(),
            merkle_root: self.get_root_hash().to_vec(),
            proof_path,
            transaction_index,
        })
    }

    /// Verify a Merkle proof
    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let mut current_hash = proof.transaction_hash.clone();

        for element in &proof.proof_path {
            current_hash = if element.is_right {
                Self::hash_pair(&current_hash, &element.hash)
            } else {
                Self::hash_pair(&element.hash, &current_hash)
            };
        }

        current_hash == proof.merkle_root
    }

    /// Calculate the Merkle root from a list of transaction hashes
    pub fn calculate_merkle_root(transaction_hashes: &[Vec<u8>]) -> Result<Vec<u8>> {
        Ok(Self::from_hashes(transaction_hashes)?.get_root_hash().to_vec())
    }

    /// Hash two values together (double SHA-256 of the concatenation)
    fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut combined = Vec::with_capacity(left.len() + right.len());
        combined.extend_from_slice(left);
        combined.extend_from_slice(right);
        double_sha256_digest(&combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(count: u8) -> Vec<Vec<u8>> {
        (0..count).map(|i| double_sha256_digest(&[i])).collect()
    }

    #[test]
    fn test_empty_transaction_list() {
        let hashes: Vec<Vec<u8>> = vec![];
        assert_eq!(
            MerkleTree::calculate_merkle_root(&hashes),
            Err(BlockchainError::EmptyTransactionSet)
        );
    }

    #[test]
    fn test_single_hash_is_its_own_root() {
        let hashes = leaves(1);
        let root = MerkleTree::calculate_merkle_root(&hashes).unwrap();
        assert_eq!(root, hashes[0]);
    }

    #[test]
    fn test_two_hashes() {
        let hashes = leaves(2);
        let root = MerkleTree::calculate_merkle_root(&hashes).unwrap();
        assert_eq!(root, MerkleTree::hash_pair(&hashes[0], &hashes[1]));
    }

    #[test]
    fn test_odd_level_duplicates_last_hash() {
        let hashes = leaves(3);
        let root = MerkleTree::calculate_merkle_root(&hashes).unwrap();

        let left = MerkleTree::hash_pair(&hashes[0], &hashes[1]);
        let right = MerkleTree::hash_pair(&hashes[2], &hashes[2]);
        assert_eq!(root, MerkleTree::hash_pair(&left, &right));
    }

    #[test]
    fn test_root_is_order_sensitive() {
        let hashes = leaves(2);
        let swapped = vec![hashes[1].clone(), hashes[0].clone()];
        assert_ne!(
            MerkleTree::calculate_merkle_root(&hashes).unwrap(),
            MerkleTree::calculate_merkle_root(&swapped).unwrap()
        );
    }

    #[test]
    fn test_root_is_reproducible() {
        let hashes = leaves(5);
        assert_eq!(
            MerkleTree::calculate_merkle_root(&hashes).unwrap(),
            MerkleTree::calculate_merkle_root(&hashes).unwrap()
        );
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for count in 1..=7 {
            let hashes = leaves(count);
            let tree = MerkleTree::from_hashes(&hashes).unwrap();
            for index in 0..hashes.len() {
                let proof = tree.generate_proof(index).unwrap();
                assert_eq!(proof.transaction_hash, hashes[index]);
                assert!(MerkleTree::verify_proof(&proof), "leaf {index} of {count}");
            }
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = MerkleTree::from_hashes(&leaves(4)).unwrap();
        let mut proof = tree.generate_proof(2).unwrap();
        proof.transaction_hash = double_sha256_digest(b"forged");
        assert!(!MerkleTree::verify_proof(&proof));
    }

    #[test]
    fn test_proof_index_out_of_bounds() {
        let tree = MerkleTree::from_hashes(&leaves(3)).unwrap();
        assert!(tree.generate_proof(3).is_err());
    }
}
