// The transaction engine: building coinbase and spend transactions, computing
// their canonical digests and validating them against the unspent set.
// Value moves under the UTXO model with pay-to-pubkey-hash locks only.

use crate::error::{BlockchainError, Result};
use crate::storage::{UtxoSource, UTXO};
use crate::utils::{current_timestamp, deserialize, double_sha256_digest, serialize};
use crate::wallet::{
    address_from_pub_key, address_to_pub_key_hash, hash_pub_key, verify_signature, Signature,
    Signer,
};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Output index carried by the coinbase sentinel input.
pub const COINBASE_VOUT: i64 = -1;

// A transaction input references output `vout` of transaction `txid`.
// The coinbase sentinel has no txid and vout -1, and reuses `pub_key` for the
// miner's note.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXInput {
    txid: Option<Vec<u8>>,
    vout: i64,
    signature: Option<Signature>,
    pub_key: Vec<u8>,
}

impl TXInput {
    /// Unsigned input spending `utxo`.
    pub fn new(utxo: &UTXO) -> TXInput {
        TXInput {
            txid: Some(utxo.get_txid().to_vec()),
            vout: utxo.get_vout() as i64,
            signature: None,
            pub_key: vec![],
        }
    }

    fn coinbase(note: &str) -> TXInput {
        TXInput {
            txid: None,
            vout: COINBASE_VOUT,
            signature: None,
            pub_key: note.as_bytes().to_vec(),
        }
    }

    pub fn get_txid(&self) -> Option<&[u8]> {
        self.txid.as_deref()
    }

    pub fn get_vout(&self) -> i64 {
        self.vout
    }

    pub fn get_signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }

    pub fn is_coinbase_sentinel(&self) -> bool {
        self.txid.is_none() && self.vout == COINBASE_VOUT
    }

    pub fn get_txid_hex(&self) -> String {
        self.txid
            .as_deref()
            .map(|txid| HEXLOWER.encode(txid))
            .unwrap_or_default()
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct TXOutput {
    value: u64,
    pub_key_hash: Vec<u8>,
}

impl TXOutput {
    /// Output of `value` locked to the key hash embedded in `address`.
    pub fn new(value: u64, address: &str) -> Result<TXOutput> {
        Ok(TXOutput {
            value,
            pub_key_hash: address_to_pub_key_hash(address)?,
        })
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash.eq(pub_key_hash)
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
    timestamp: i64,
}

impl Transaction {
    /// Reward transaction: one sentinel input carrying `note`, one output.
    pub fn new_coinbase_tx(to: &str, reward: u64, note: &str) -> Result<Transaction> {
        let txout = TXOutput::new(reward, to)?;
        Ok(Transaction {
            vin: vec![TXInput::coinbase(note)],
            vout: vec![txout],
            timestamp: current_timestamp()?,
        })
    }

    /// Builds and signs a payment of `amount` from `from` to `to`.
    ///
    /// Unspent outputs are taken first-fit in the order `utxo_source` returns
    /// them until they cover `amount`. The second output returns the change to
    /// `from`, even when it is zero. One signature over the unsigned digest is
    /// stamped on every input.
    pub fn new_utxo_transaction<S, K>(
        from: &str,
        to: &str,
        amount: u64,
        utxo_source: &S,
        signer: &K,
    ) -> Result<Transaction>
    where
        S: UtxoSource + ?Sized,
        K: Signer + ?Sized,
    {
        if amount == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }

        let from_pub_key_hash = address_to_pub_key_hash(from)?;
        let payment = TXOutput::new(amount, to)?;
        if hash_pub_key(signer.public_key()) != from_pub_key_hash {
            return Err(BlockchainError::Wallet(format!(
                "Signer does not hold the key for {from}"
            )));
        }

        let (utxos, available) = utxo_source.find_utxos(from)?;
        if available < amount {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let mut accumulated = 0u64;
        let mut inputs = vec![];
        for utxo in &utxos {
            accumulated = accumulated
                .checked_add(utxo.get_output().get_value())
                .ok_or_else(|| BlockchainError::Transaction("Input value overflow".to_string()))?;
            inputs.push(TXInput::new(utxo));
            if accumulated >= amount {
                break;
            }
        }

        // The reported total is only a hint; the listed outputs must cover the amount
        let change_value = accumulated.checked_sub(amount).ok_or(
            BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            },
        )?;
        let change = TXOutput {
            value: change_value,
            pub_key_hash: from_pub_key_hash,
        };

        let mut tx = Transaction {
            vin: inputs,
            vout: vec![payment, change],
            timestamp: current_timestamp()?,
        };

        let signature = signer.sign(&tx.hash()?)?;
        for vin in tx.vin.iter_mut() {
            vin.signature = Some(signature.clone());
            vin.pub_key = signer.public_key().to_vec();
        }
        Ok(tx)
    }

    /// Copy with every unlocking field cleared; its digest is the signed message.
    fn trimmed_copy(&self) -> Transaction {
        let vin = self
            .vin
            .iter()
            .map(|input| TXInput {
                signature: None,
                pub_key: vec![],
                ..input.clone()
            })
            .collect();
        Transaction {
            vin,
            vout: self.vout.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Double SHA-256 of the canonical encoding. This is the transaction id.
    pub fn hash(&self) -> Result<Vec<u8>> {
        Ok(double_sha256_digest(&self.serialize()?))
    }

    pub fn get_hash_hex(&self) -> Result<String> {
        Ok(HEXLOWER.encode(&self.hash()?))
    }

    /// Digest every input's signature must cover.
    pub fn signing_digest(&self) -> Result<Vec<u8>> {
        self.trimmed_copy().hash()
    }

    /// Checks the transaction against the unspent set exposed by `utxo_source`.
    ///
    /// A coinbase is accepted as is. Any other transaction needs at least one
    /// input, and every input must claim a distinct
    /// unspent output, unlock it with the matching public key and carry a
    /// signature over [`Transaction::signing_digest`]. Inputs must cover the
    /// outputs; any surplus is not claimed by anyone.
    pub fn validate<S>(&self, utxo_source: &S) -> Result<()>
    where
        S: UtxoSource + ?Sized,
    {
        if self.is_coinbase() {
            return Ok(());
        }
        if self.vin.is_empty() {
            return Err(BlockchainError::Transaction(
                "Transaction has no inputs".to_string(),
            ));
        }

        let digest = self.signing_digest()?;
        let mut candidates: HashMap<String, Vec<UTXO>> = HashMap::new();
        let mut input_value = 0u64;

        for vin in &self.vin {
            let txid = vin.get_txid_hex();
            if vin.txid.is_none() {
                return Err(BlockchainError::NotAnUnspentOutput {
                    txid,
                    vout: vin.vout,
                });
            }

            let utxos = match candidates.entry(address_from_pub_key(&vin.pub_key)) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let (utxos, _) = utxo_source.find_utxos(entry.key())?;
                    entry.insert(utxos)
                }
            };

            let position = utxos
                .iter()
                .position(|utxo| utxo.matches_input(vin))
                .ok_or_else(|| BlockchainError::NotAnUnspentOutput {
                    txid: txid.clone(),
                    vout: vin.vout,
                })?;
            // Claimed outputs leave the candidate set so no later input can reuse them
            let utxo = utxos.remove(position);

            if !utxo.get_output().is_locked_with_key(&hash_pub_key(&vin.pub_key)) {
                return Err(BlockchainError::LockMismatch {
                    txid,
                    vout: vin.vout,
                });
            }

            let verified = vin
                .signature
                .as_ref()
                .is_some_and(|signature| verify_signature(&vin.pub_key, &digest, signature));
            if !verified {
                return Err(BlockchainError::BadSignature {
                    txid,
                    vout: vin.vout,
                });
            }

            input_value = input_value
                .checked_add(utxo.get_output().get_value())
                .ok_or_else(|| BlockchainError::Transaction("Input value overflow".to_string()))?;
        }

        let output_value = self.get_output_value()?;
        if input_value < output_value {
            return Err(BlockchainError::Overspend {
                inputs: input_value,
                outputs: output_value,
            });
        }
        Ok(())
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_coinbase_sentinel()
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_output_value(&self) -> Result<u64> {
        let mut total = 0u64;
        for vout in &self.vout {
            total = total
                .checked_add(vout.get_value())
                .ok_or_else(|| BlockchainError::Transaction("Output value overflow".to_string()))?;
        }
        Ok(total)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self
            .get_hash_hex()
            .unwrap_or_else(|_| "<unencodable>".to_string());
        writeln!(f, "--- Transaction {hash}:")?;

        for (i, input) in self.vin.iter().enumerate() {
            writeln!(f, "     Input {i}:")?;
            writeln!(f, "       TXID:      {}", input.get_txid_hex())?;
            writeln!(f, "       Out:       {}", input.vout)?;
            match &input.signature {
                Some(signature) => writeln!(f, "       Signature: {signature}")?,
                None => writeln!(f, "       Signature: none")?,
            }
            writeln!(f, "       PubKey:    {}", HEXLOWER.encode(&input.pub_key))?;
        }

        for (i, output) in self.vout.iter().enumerate() {
            writeln!(f, "     Output {i}:")?;
            writeln!(f, "       Value:      {}", output.value)?;
            write!(
                f,
                "       PubKeyHash: {}",
                HEXLOWER.encode(&output.pub_key_hash)
            )?;
            if i + 1 < self.vout.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
