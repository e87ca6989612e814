//! Nullable wallet adapter.

use async_trait::async_trait;
use solwatch_rpc::ChainClient;
use solwatch_transactions::Transaction;
use solwatch_types::{Commitment, Pubkey, Signature};
use solwatch_wallet_core::{WalletAdapter, WalletError};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;

/// A wallet that "signs" with deterministic fake signatures and can be told
/// to reject.
pub struct NullWallet {
    name: String,
    pubkey: Pubkey,
    connected: AtomicBool,
    rejection: Mutex<Option<String>>,
    signed: Mutex<Vec<Transaction>>,
    counter: AtomicU8,
}

impl NullWallet {
    pub fn new(name: impl Into<String>, pubkey: Pubkey) -> Self {
        Self {
            name: name.into(),
            pubkey,
            connected: AtomicBool::new(false),
            rejection: Mutex::new(None),
            signed: Mutex::new(Vec::new()),
            counter: AtomicU8::new(1),
        }
    }

    /// Reject every subsequent `send_transaction` with `reason`.
    pub fn reject_with(&self, reason: impl Into<String>) {
        *self.rejection.lock().unwrap() = Some(reason.into());
    }

    /// Transactions this wallet agreed to sign.
    pub fn signed(&self) -> Vec<Transaction> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletAdapter for NullWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected.load(Ordering::SeqCst).then_some(self.pubkey)
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.pubkey)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send_transaction(
        &self,
        mut transaction: Transaction,
        client: &dyn ChainClient,
        commitment: Commitment,
    ) -> Result<Signature, WalletError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected);
        }
        if let Some(reason) = self.rejection.lock().unwrap().clone() {
            return Err(WalletError::Other(reason));
        }
        let fake = Signature::new([self.counter.fetch_add(1, Ordering::SeqCst); 64]);
        transaction.add_signature(&self.pubkey, fake)?;
        self.signed.lock().unwrap().push(transaction.clone());
        let wire = transaction.serialize()?;
        Ok(client.send_transaction(&wire, commitment).await?)
    }
}
