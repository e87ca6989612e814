//! Fundamental types for solwatch.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! networks and the endpoints derived from them, base58 keys and signatures,
//! lamport amounts and commitment levels.

#[macro_use]
mod macros;

pub mod address;
pub mod amount;
pub mod commitment;
pub mod endpoint;
pub mod error;
pub mod hash;
pub mod network;

pub use address::Pubkey;
pub use amount::{Lamports, LAMPORTS_PER_SOL};
pub use commitment::Commitment;
pub use endpoint::{Endpoint, EndpointOverrides};
pub use error::TypeError;
pub use hash::{Blockhash, Signature};
pub use network::Network;
