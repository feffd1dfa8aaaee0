use crate::core::BlockHeader;
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::{debug, info};
use num_bigint::{BigInt, Sign};
use std::ops::ShlAssign;
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of bits in a header digest.
const HASH_BITS: u32 = 256;

/// Searches for a nonce that puts the header digest below `2^(256 - difficulty)`.
///
/// Sealing is functional: the unsealed header goes in, a sealed copy comes out.
pub struct ProofOfWork<'a> {
    header: BlockHeader,
    target: BigInt,
    max_nonce: u64,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ProofOfWork<'a> {
    pub fn new_proof_of_work(header: BlockHeader) -> ProofOfWork<'a> {
        let target = Self::target_for(header.get_difficulty());
        ProofOfWork {
            header,
            target,
            max_nonce: u64::MAX,
            cancel: None,
        }
    }

    /// Caps the nonce search; the full `u64` range is searched by default.
    pub fn with_max_nonce(mut self, max_nonce: u64) -> ProofOfWork<'a> {
        self.max_nonce = max_nonce;
        self
    }

    /// Stops the search with a mining error once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> ProofOfWork<'a> {
        self.cancel = Some(flag);
        self
    }

    pub fn target_for(difficulty: u32) -> BigInt {
        let mut target = BigInt::from(1);
        target.shl_assign(HASH_BITS.saturating_sub(difficulty));
        target
    }

    /// Validate proof-of-work for a sealed header
    pub fn validate(header: &BlockHeader) -> bool {
        Self::meets_target(&header.hash(), &Self::target_for(header.get_difficulty()))
    }

    fn meets_target(hash: &[u8], target: &BigInt) -> bool {
        BigInt::from_bytes_be(Sign::Plus, hash) < *target
    }

    pub fn run(&self) -> Result<BlockHeader> {
        let difficulty = self.header.get_difficulty();
        debug!("Mining the block at difficulty {difficulty}");

        let mut nonce: u64 = 0;
        loop {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(BlockchainError::Mining(format!(
                    "Sealing cancelled after {nonce} attempts"
                )));
            }

            let candidate = self.header.with_nonce(nonce);
            let hash = candidate.hash();
            if Self::meets_target(&hash, &self.target) {
                info!(
                    "Found nonce {nonce} for difficulty {difficulty}: {}",
                    HEXLOWER.encode(&hash)
                );
                return Ok(candidate);
            }

            if nonce >= self.max_nonce {
                return Err(BlockchainError::NoNonceFound { difficulty });
            }
            nonce += 1;
        }
    }
}
