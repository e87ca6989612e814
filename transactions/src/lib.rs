//! Transaction construction for solwatch.
//!
//! Only what a native-token transfer needs: instructions, message
//! compilation into the legacy wire format, and the signature envelope.
//! Signing itself happens in the wallet adapter.

pub mod compact;
pub mod error;
pub mod instruction;
pub mod message;
pub mod system;
pub mod transaction;

pub use error::TransactionError;
pub use instruction::{AccountMeta, CompiledInstruction, Instruction};
pub use message::{Message, MessageHeader};
pub use system::transfer;
pub use transaction::Transaction;
