use crate::error::{BlockchainError, Result};
use crate::utils::{
    base58_decode, base58_encode, double_sha256_digest, ecdsa_p256_sha256_sign_digest,
    new_key_pair, public_key_coordinates, ripemd160_digest, sha256_digest,
};
use crate::wallet::{Signature, Signer};
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;
const PUB_KEY_HASH_LEN: usize = 20;
const ADDRESS_PAYLOAD_LEN: usize = 1 + PUB_KEY_HASH_LEN + ADDRESS_CHECK_SUM_LEN;

/// A P-256 key pair. The PKCS#8 document is wiped when the wallet is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        let public_key = public_key_coordinates(&pkcs8)?;
        Ok(Wallet { pkcs8, public_key })
    }

    pub fn get_address(&self) -> String {
        address_from_pub_key(self.public_key.as_slice())
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }
}

impl Signer for Wallet {
    fn public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    fn sign(&self, digest: &[u8]) -> Result<Signature> {
        let fixed = ecdsa_p256_sha256_sign_digest(&self.pkcs8, digest)?;
        Signature::from_fixed(&fixed)
    }
}

/// Locking hash of a public key: RIPEMD160(SHA256(pub_key)).
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(pub_key);
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    double_sha256_digest(payload)[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}

pub fn address_from_pub_key(pub_key: &[u8]) -> String {
    convert_address(hash_pub_key(pub_key).as_slice())
}

pub fn convert_address(pub_hash_key: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![];
    payload.push(VERSION);
    payload.extend(pub_hash_key);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    // version + pub_key_hash + checksum
    base58_encode(payload.as_slice())
}

/// Decodes an address back to the public key hash it embeds, checking the
/// payload length and trailing checksum first.
pub fn address_to_pub_key_hash(address: &str) -> Result<Vec<u8>> {
    let payload = base58_decode(address)?;
    if payload.len() != ADDRESS_PAYLOAD_LEN {
        return Err(BlockchainError::AddressFormat(format!(
            "{address}: expected {ADDRESS_PAYLOAD_LEN} bytes, got {}",
            payload.len()
        )));
    }

    let (body, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    if checksum(body) != actual_checksum {
        return Err(BlockchainError::AddressFormat(format!(
            "{address}: checksum mismatch"
        )));
    }
    Ok(body[1..].to_vec())
}

pub fn validate_address(address: &str) -> bool {
    address_to_pub_key_hash(address).is_ok()
}
