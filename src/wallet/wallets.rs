use crate::error::Result;
use crate::wallet::Wallet;
use std::collections::HashMap;

/// In-memory key registry: address -> key pair.
#[derive(Default)]
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
}

impl Wallets {
    pub fn new() -> Wallets {
        Wallets {
            wallets: HashMap::new(),
        }
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        log::debug!("Registered key pair for {address}");
        self.wallets.insert(address.clone(), wallet);
        Ok(address)
    }

    /// Addresses in sorted order.
    pub fn get_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.wallets.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
