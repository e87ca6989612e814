//! A wallet adapter backed by a local keypair file.

use async_trait::async_trait;
use solwatch_crypto::{read_keypair_file, sign_message, Keypair};
use solwatch_rpc::ChainClient;
use solwatch_transactions::Transaction;
use solwatch_types::{Commitment, Pubkey, Signature};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::adapter::WalletAdapter;
use crate::error::WalletError;

/// Signs with an Ed25519 keypair held in memory.
///
/// "Connecting" only toggles whether the key is exposed to the session; the
/// keypair is loaded when the adapter is created.
pub struct KeypairWallet {
    name: String,
    keypair: Keypair,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(name: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            keypair,
            connected: AtomicBool::new(false),
        }
    }

    /// Load a `solana-keygen` JSON keypair file.
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let keypair = read_keypair_file(path)?;
        Ok(Self::new(name, keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::Acquire)
            .then(|| self.keypair.pubkey())
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::Release);
        info!(wallet = %self.name, pubkey = %self.keypair.pubkey(), "wallet connected");
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::Release);
        info!(wallet = %self.name, "wallet disconnected");
        Ok(())
    }

    async fn send_transaction(
        &self,
        mut transaction: Transaction,
        client: &dyn ChainClient,
        commitment: Commitment,
    ) -> Result<Signature, WalletError> {
        let Some(pubkey) = self.public_key() else {
            return Err(WalletError::NotConnected);
        };
        let signature = sign_message(&transaction.message().serialize(), &self.keypair);
        transaction
            .add_signature(&pubkey, signature)
            .map_err(|_| WalletError::CannotSign(pubkey.to_string()))?;
        let wire = transaction.serialize()?;
        Ok(client.send_transaction(&wire, commitment).await?)
    }
}
