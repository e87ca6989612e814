//! Cryptographic primitives for solwatch.
//!
//! - **Ed25519** keypairs, signing and verification via `ed25519-dalek`
//! - Loading keypair files in the Solana CLI format (a JSON array of 64 bytes)

pub mod keys;
pub mod sign;

pub use keys::{keypair_from_seed, read_keypair_file, CryptoError, Keypair};
pub use sign::{sign_message, verify_signature};
