use crate::error::{BlockchainError, Result};
use crate::utils::ecdsa_p256_sha256_sign_verify;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

const SCALAR_LEN: usize = 32;

/// ECDSA signature as its two scalars, each stored big-endian in 32 bytes.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Signature {
    r: [u8; SCALAR_LEN],
    s: [u8; SCALAR_LEN],
}

impl Signature {
    /// Splits a fixed-width `r || s` encoding.
    pub fn from_fixed(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != 2 * SCALAR_LEN {
            return Err(BlockchainError::Crypto(format!(
                "Expected a {}-byte signature, got {}",
                2 * SCALAR_LEN,
                bytes.len()
            )));
        }
        let mut r = [0u8; SCALAR_LEN];
        let mut s = [0u8; SCALAR_LEN];
        r.copy_from_slice(&bytes[..SCALAR_LEN]);
        s.copy_from_slice(&bytes[SCALAR_LEN..]);
        Ok(Signature { r, s })
    }

    pub fn to_fixed(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 * SCALAR_LEN);
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes
    }

    pub fn r(&self) -> BigUint {
        BigUint::from_bytes_be(&self.r)
    }

    pub fn s(&self) -> BigUint {
        BigUint::from_bytes_be(&self.s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(r: {:x}, s: {:x})", self.r(), self.s())
    }
}

/// Holder of a private key that can sign transaction digests.
pub trait Signer {
    /// Raw `X || Y` public key.
    fn public_key(&self) -> &[u8];

    fn sign(&self, digest: &[u8]) -> Result<Signature>;
}

pub fn verify_signature(public_key: &[u8], digest: &[u8], signature: &Signature) -> bool {
    ecdsa_p256_sha256_sign_verify(public_key, &signature.to_fixed(), digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    #[test]
    fn test_from_fixed_rejects_wrong_length() {
        assert!(Signature::from_fixed(&[0u8; 63]).is_err());
    }

    #[test]
    fn test_scalars_are_big_endian() {
        let mut bytes = [0u8; 64];
        bytes[31] = 7;
        bytes[63] = 9;
        let signature = Signature::from_fixed(&bytes).unwrap();
        assert_eq!(signature.r(), BigUint::from(7u32));
        assert_eq!(signature.s(), BigUint::from(9u32));
        assert_eq!(signature.to_fixed(), bytes.to_vec());
    }

    #[test]
    fn test_wallet_signature_verifies() {
        let wallet = Wallet::new().unwrap();
        let digest = crate::utils::double_sha256_digest(b"tx");
        let signature = wallet.sign(&digest).unwrap();

        assert!(verify_signature(wallet.public_key(), &digest, &signature));

        let other = Wallet::new().unwrap();
        assert!(!verify_signature(other.public_key(), &digest, &signature));
    }
}
