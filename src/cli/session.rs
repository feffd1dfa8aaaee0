// One interactive session: the key registry, the ledger (once created) and the
// configuration it was created with. Both the shell and the demo drive the
// ledger through Session::execute, so there is a single command dispatcher.

use crate::cli::ShellCommand;
use crate::config::Config;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::wallet::{address_from_pub_key, convert_address, Wallets};
use data_encoding::HEXLOWER;
use log::info;
use serde_json::json;
use std::io::Write;
use std::ops::ControlFlow;

pub struct Session {
    config: Config,
    wallets: Wallets,
    blockchain: Option<Blockchain>,
}

impl Session {
    pub fn new(config: Config) -> Session {
        Session {
            config,
            wallets: Wallets::new(),
            blockchain: None,
        }
    }

    pub fn get_wallets(&self) -> &Wallets {
        &self.wallets
    }

    pub fn get_blockchain(&self) -> Option<&Blockchain> {
        self.blockchain.as_ref()
    }

    fn blockchain(&self) -> Result<&Blockchain> {
        self.blockchain
            .as_ref()
            .ok_or(BlockchainError::ChainNotInitialized)
    }

    /// Runs one command and returns the text to show the user.
    pub fn execute(&mut self, command: ShellCommand) -> Result<String> {
        match command {
            ShellCommand::Createblockchain { address } => {
                if let Some(blockchain) = &self.blockchain {
                    return Ok(format!(
                        "Blockchain already exists with {} blocks",
                        blockchain.len()
                    ));
                }
                let blockchain = Blockchain::create_blockchain(&address, self.config.clone())?;
                self.blockchain = Some(blockchain);
                Ok("Done!".to_string())
            }
            ShellCommand::Createwallet => {
                let address = self.wallets.create_wallet()?;
                Ok(format!("Your new address: {address}"))
            }
            ShellCommand::GetBalance { address } => {
                let balance = UTXOSet::new(self.blockchain()?).get_balance(&address)?;
                Ok(format!("Balance of {address}: {balance}"))
            }
            ShellCommand::ListAddresses => Ok(self.wallets.get_addresses().join("\n")),
            ShellCommand::Send {
                from,
                to,
                amount,
                miner,
            } => self.send(&from, &to, amount, &miner),
            ShellCommand::Printchain { json } => {
                let blockchain = self.blockchain()?;
                if json {
                    format_chain_json(blockchain)
                } else {
                    format_chain(blockchain)
                }
            }
            ShellCommand::Printtx => format_transactions(self.blockchain()?),
            ShellCommand::Validatechain => {
                let blockchain = self.blockchain()?;
                blockchain.validate_chain()?;
                Ok(format!("Chain is valid ({} blocks)", blockchain.len()))
            }
            ShellCommand::Exit => Ok(String::new()),
        }
    }

    fn send(&mut self, from: &str, to: &str, amount: u64, miner: &str) -> Result<String> {
        let blockchain = self
            .blockchain
            .as_mut()
            .ok_or(BlockchainError::ChainNotInitialized)?;
        let wallet = self
            .wallets
            .get_wallet(from)
            .ok_or_else(|| BlockchainError::Wallet(format!("No key held for {from}")))?;

        let transaction =
            Transaction::new_utxo_transaction(from, to, amount, &UTXOSet::new(blockchain), wallet)?;
        let note = self.config.miner_note.clone();
        let block = blockchain.add_block(&[transaction], miner, &note)?;
        Ok(format!(
            "Sent {amount} from {from} to {to} in block {}",
            block.get_hash_hex()
        ))
    }

    /// Four wallets, a genesis paying the first, three payments out of it and
    /// three between the others, each mined into its own block by the first.
    pub fn run_demo<W: Write>(&mut self, out: &mut W) -> Result<()> {
        for _ in 0..4 {
            let line = self.execute(ShellCommand::Createwallet)?;
            writeln!(out, "{line}")?;
        }
        let addresses = self.wallets.get_addresses();
        let (a1, a2, a3, a4) = (&addresses[0], &addresses[1], &addresses[2], &addresses[3]);

        let line = self.execute(ShellCommand::Createblockchain {
            address: a1.clone(),
        })?;
        writeln!(out, "{line}")?;

        writeln!(out, "send ----------------------")?;
        let payments = [
            (a1, a2, 10),
            (a1, a3, 10),
            (a1, a4, 10),
            (a2, a3, 1),
            (a2, a4, 1),
            (a3, a4, 1),
        ];
        for (from, to, amount) in payments {
            let line = self.execute(ShellCommand::Send {
                from: from.clone(),
                to: to.clone(),
                amount,
                miner: a1.clone(),
            })?;
            writeln!(out, "{line}")?;
        }

        writeln!(out, "getbalance ----------------------")?;
        for address in [a1, a2, a3, a4] {
            let line = self.execute(ShellCommand::GetBalance {
                address: address.clone(),
            })?;
            writeln!(out, "{line}")?;
        }

        writeln!(out, "printchain ----------------------")?;
        writeln!(out, "{}", self.execute(ShellCommand::Printchain { json: false })?)?;
        writeln!(out, "printtx ----------------------")?;
        writeln!(out, "{}", self.execute(ShellCommand::Printtx)?)?;
        writeln!(out, "{}", self.execute(ShellCommand::Validatechain)?)?;
        info!("Demo finished");
        Ok(())
    }
}

fn hash_or_none(hash: Option<&[u8]>) -> String {
    hash.map(|hash| HEXLOWER.encode(hash))
        .unwrap_or_else(|| "None".to_string())
}

fn format_block(block: &Block) -> Result<String> {
    let mut lines = vec![
        format!("Pre block hash: {}", hash_or_none(block.get_pre_block_hash())),
        format!("Cur block hash: {}", block.get_hash_hex()),
        format!("Version: {}", block.get_header().get_version()),
        format!("Merkle root: {}", HEXLOWER.encode(block.get_merkle_root())),
        format!("Timestamp: {}", block.get_timestamp()),
        format!("Difficulty: {}", block.get_difficulty()),
        format!("Nonce: {}", block.get_nonce()),
        format!("Data: {}", block.get_miner_note().unwrap_or_default()),
    ];

    for tx in block.get_transactions() {
        lines.push(format!("- Transaction txid_hex: {}", tx.get_hash_hex()?));
        if !tx.is_coinbase() {
            for input in tx.get_vin() {
                lines.push(format!(
                    "-- Input txid = {}, vout = {}, from = {}",
                    input.get_txid_hex(),
                    input.get_vout(),
                    address_from_pub_key(input.get_pub_key())
                ));
            }
        }
        for output in tx.get_vout() {
            lines.push(format!(
                "-- Output value = {}, to = {}",
                output.get_value(),
                convert_address(output.get_pub_key_hash())
            ));
        }
    }
    Ok(lines.join("\n"))
}

fn format_chain(blockchain: &Blockchain) -> Result<String> {
    let mut blocks = vec![];
    blockchain.traverse(|block| {
        blocks.push(format_block(block)?);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(blocks.join("\n\n"))
}

fn format_chain_json(blockchain: &Blockchain) -> Result<String> {
    let mut blocks = vec![];
    blockchain.traverse(|block| {
        let mut transactions = vec![];
        for tx in block.get_transactions() {
            let inputs: Vec<_> = tx
                .get_vin()
                .iter()
                .map(|input| {
                    json!({
                        "txid": input.get_txid_hex(),
                        "vout": input.get_vout(),
                        "signature": input.get_signature().map(|s| s.to_string()),
                        "pub_key": HEXLOWER.encode(input.get_pub_key()),
                    })
                })
                .collect();
            let outputs: Vec<_> = tx
                .get_vout()
                .iter()
                .map(|output| {
                    json!({
                        "value": output.get_value(),
                        "to": convert_address(output.get_pub_key_hash()),
                    })
                })
                .collect();
            transactions.push(json!({
                "txid": tx.get_hash_hex()?,
                "timestamp": tx.get_timestamp(),
                "inputs": inputs,
                "outputs": outputs,
            }));
        }

        blocks.push(json!({
            "hash": block.get_hash_hex(),
            "pre_block_hash": block.get_pre_block_hash().map(|h| HEXLOWER.encode(h)),
            "version": block.get_header().get_version(),
            "merkle_root": HEXLOWER.encode(block.get_merkle_root()),
            "timestamp": block.get_timestamp(),
            "difficulty": block.get_difficulty(),
            "nonce": block.get_nonce(),
            "data": block.get_miner_note(),
            "transactions": transactions,
        }));
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(serde_json::to_string_pretty(&blocks)?)
}

fn format_transactions(blockchain: &Blockchain) -> Result<String> {
    let mut sections = vec![];
    blockchain.traverse(|block| {
        sections.push(format!(
            "+++++++++++++ Block {} +++++++++++++",
            block.get_hash_hex()
        ));
        for tx in block.get_transactions() {
            sections.push(tx.to_string());
        }
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(sections.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_config;

    fn session_with_chain(wallets: usize) -> (Session, Vec<String>) {
        let mut session = Session::new(test_config());
        for _ in 0..wallets {
            session.execute(ShellCommand::Createwallet).unwrap();
        }
        let addresses = session.get_wallets().get_addresses();
        session
            .execute(ShellCommand::Createblockchain {
                address: addresses[0].clone(),
            })
            .unwrap();
        (session, addresses)
    }

    fn balance(session: &mut Session, address: &str) -> String {
        session
            .execute(ShellCommand::GetBalance {
                address: address.to_string(),
            })
            .unwrap()
    }

    #[test]
    fn test_commands_need_a_chain() {
        let mut session = Session::new(test_config());
        assert!(session.get_wallets().is_empty());
        assert_eq!(
            session.execute(ShellCommand::Printtx),
            Err(BlockchainError::ChainNotInitialized)
        );
        assert_eq!(
            session.execute(ShellCommand::Validatechain),
            Err(BlockchainError::ChainNotInitialized)
        );
    }

    #[test]
    fn test_createblockchain_is_idempotent() {
        let (mut session, addresses) = session_with_chain(1);
        let reply = session
            .execute(ShellCommand::Createblockchain {
                address: addresses[0].clone(),
            })
            .unwrap();
        assert!(reply.contains("already exists"));
        assert_eq!(session.get_blockchain().unwrap().len(), 1);
    }

    #[test]
    fn test_send_moves_value_and_mines() {
        let (mut session, addresses) = session_with_chain(3);
        session
            .execute(ShellCommand::Send {
                from: addresses[0].clone(),
                to: addresses[1].clone(),
                amount: 10,
                miner: addresses[2].clone(),
            })
            .unwrap();

        assert_eq!(
            balance(&mut session, &addresses[0]),
            format!("Balance of {}: 40", addresses[0])
        );
        assert_eq!(
            balance(&mut session, &addresses[1]),
            format!("Balance of {}: 10", addresses[1])
        );
        assert_eq!(
            balance(&mut session, &addresses[2]),
            format!("Balance of {}: 50", addresses[2])
        );
        assert_eq!(session.get_blockchain().unwrap().len(), 2);
    }

    #[test]
    fn test_send_without_key_is_a_wallet_error() {
        let (mut session, addresses) = session_with_chain(1);
        let stranger = crate::wallet::Wallet::new().unwrap().get_address();
        let result = session.execute(ShellCommand::Send {
            from: stranger,
            to: addresses[0].clone(),
            amount: 1,
            miner: addresses[0].clone(),
        });
        assert!(matches!(result, Err(BlockchainError::Wallet(_))));
    }

    #[test]
    fn test_overdraft_leaves_chain_alone() {
        let (mut session, addresses) = session_with_chain(2);
        let result = session.execute(ShellCommand::Send {
            from: addresses[0].clone(),
            to: addresses[1].clone(),
            amount: 51,
            miner: addresses[0].clone(),
        });
        assert_eq!(
            result,
            Err(BlockchainError::InsufficientFunds {
                required: 51,
                available: 50
            })
        );
        assert_eq!(session.get_blockchain().unwrap().len(), 1);
    }

    #[test]
    fn test_printchain_formats() {
        let (mut session, _) = session_with_chain(1);
        let text = session
            .execute(ShellCommand::Printchain { json: false })
            .unwrap();
        assert!(text.contains("Pre block hash: None"));
        assert!(text.contains("Data: Genesis Block"));

        let json = session
            .execute(ShellCommand::Printchain { json: true })
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["data"], "Genesis Block");
        assert!(parsed[0]["pre_block_hash"].is_null());
        assert_eq!(parsed[0]["transactions"][0]["outputs"][0]["value"], 50);
    }

    #[test]
    fn test_demo_balances() {
        let mut session = Session::new(test_config());
        let mut out = Vec::new();
        session.run_demo(&mut out).unwrap();

        let addresses = session.get_wallets().get_addresses();
        let blockchain = session.get_blockchain().unwrap();
        let utxo_set = UTXOSet::new(blockchain);
        let balances: Vec<u64> = addresses
            .iter()
            .map(|address| utxo_set.get_balance(address).unwrap())
            .collect();

        assert_eq!(balances, vec![320, 8, 10, 12]);
        assert_eq!(balances.iter().sum::<u64>(), 350);
        assert_eq!(blockchain.len(), 7);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Chain is valid (7 blocks)"));
    }
}
