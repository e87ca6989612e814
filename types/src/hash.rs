//! Transaction signatures and blockhashes.

/// A 64-byte Ed25519 signature. The first signature of a transaction doubles
/// as its identifier on chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

base58_bytes!(Signature, 64);

/// A recent blockhash, included in every transaction message as a lifetime bound.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

base58_bytes!(Blockhash, 32);

impl Signature {
    /// Placeholder written into unsigned signature slots.
    pub const DEFAULT: Self = Self([0u8; 64]);
}

impl Default for Signature {
    fn default() -> Self {
        Self::DEFAULT
    }
}
