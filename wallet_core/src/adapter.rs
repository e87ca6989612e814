//! The wallet adapter seam.

use async_trait::async_trait;
use solwatch_rpc::ChainClient;
use solwatch_transactions::Transaction;
use solwatch_types::{Commitment, Pubkey, Signature};

use crate::WalletError;

/// A wallet the user can connect. Owns key management and signing.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Display name, also used for selection.
    fn name(&self) -> &str;

    /// The connected account, or `None` while disconnected.
    fn public_key(&self) -> Option<Pubkey>;

    async fn connect(&self) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Sign `transaction` and submit it through `client`, returning the
    /// transaction signature.
    async fn send_transaction(
        &self,
        transaction: Transaction,
        client: &dyn ChainClient,
        commitment: Commitment,
    ) -> Result<Signature, WalletError>;
}
