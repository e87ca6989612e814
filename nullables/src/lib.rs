//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator (chain RPC, pubsub, wallet, preference storage)
//! is abstracted behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return scripted values
//! - Record every call so tests can count and inspect them
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod store;
pub mod wallet;

pub use chain::NullChain;
pub use store::NullPreferenceStore;
pub use wallet::NullWallet;
