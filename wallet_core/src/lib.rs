//! Wallet core library for solwatch.
//!
//! Provides everything the session panel needs from a wallet:
//! - the [`WalletAdapter`] trait (connected key, connect/disconnect, sign and submit)
//! - [`KeypairWallet`], an adapter backed by a `solana-keygen` keypair file
//! - [`WalletRegistry`] for choosing between several configured adapters
//! - transfer building against a recent blockhash

pub mod adapter;
pub mod error;
pub mod registry;
pub mod transaction_builder;
pub mod wallet;

pub use adapter::WalletAdapter;
pub use error::WalletError;
pub use registry::WalletRegistry;
pub use transaction_builder::build_transfer;
pub use wallet::KeypairWallet;
