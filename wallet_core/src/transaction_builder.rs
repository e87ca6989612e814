//! Transaction building helpers.

use solwatch_rpc::ChainClient;
use solwatch_transactions::{system, Message, Transaction};
use solwatch_types::{Commitment, Lamports, Pubkey};

use crate::error::WalletError;

/// Build an unsigned native-token transfer paid for by `from`, bound to the
/// cluster's latest blockhash.
pub async fn build_transfer(
    client: &dyn ChainClient,
    from: &Pubkey,
    to: &Pubkey,
    lamports: Lamports,
    commitment: Commitment,
) -> Result<Transaction, WalletError> {
    let instruction = system::transfer(from, to, lamports)?;
    let blockhash = client.get_latest_blockhash(commitment).await?;
    let message = Message::new(&[instruction], from, blockhash)?;
    Ok(Transaction::new_unsigned(message))
}
