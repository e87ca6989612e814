//! Account addresses.

/// A 32-byte Ed25519 public key identifying an account, rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; 32]);

base58_bytes!(Pubkey, 32);

impl Pubkey {
    /// The system program (`11111111111111111111111111111111`).
    pub const SYSTEM_PROGRAM: Self = Self([0u8; 32]);
}
