//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, VerifyingKey};
use solwatch_types::{Pubkey, Signature};

use crate::keys::Keypair;

/// Sign a message, returning the signature.
pub fn sign_message(message: &[u8], keypair: &Keypair) -> Signature {
    let sig = keypair.signing_key().sign(message);
    Signature::new(sig.to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &Pubkey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}
