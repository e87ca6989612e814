//! Ed25519 keypairs.

use ed25519_dalek::SigningKey;
use solwatch_types::Pubkey;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to read keypair file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("keypair file is not a JSON byte array: {0}")]
    Format(String),

    #[error("keypair must be 64 bytes, got {0}")]
    Length(usize),

    #[error("public half of the keypair does not match its secret")]
    Mismatch,
}

/// An Ed25519 keypair. Secret bytes are zeroized on drop by `ed25519-dalek`.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Build from the 64-byte `secret || public` layout used by keypair files.
    ///
    /// The public half is checked against the one derived from the secret.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: &[u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::Length(bytes.len()))?;
        let signing = SigningKey::from_keypair_bytes(bytes).map_err(|_| CryptoError::Mismatch)?;
        Ok(Self { signing })
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing.verifying_key().to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    /// The 64-byte `secret || public` encoding.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing.to_keypair_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("pubkey", &self.pubkey()).finish()
    }
}

/// Derive a keypair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> Keypair {
    Keypair {
        signing: SigningKey::from_bytes(seed),
    }
}

/// Read a keypair file written by `solana-keygen`.
pub fn read_keypair_file(path: impl AsRef<Path>) -> Result<Keypair, CryptoError> {
    let path = path.as_ref();
    let mut contents = std::fs::read_to_string(path).map_err(|source| CryptoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: Result<Vec<u8>, _> = serde_json::from_str(&contents);
    contents.zeroize();
    let mut bytes = parsed.map_err(|e| CryptoError::Format(e.to_string()))?;
    let keypair = Keypair::from_bytes(&bytes);
    bytes.zeroize();
    keypair
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = keypair_from_seed(&[42u8; 32]);
        let b = keypair_from_seed(&[42u8; 32]);
        assert_eq!(a.pubkey(), b.pubkey());
        assert_ne!(a.pubkey(), keypair_from_seed(&[43u8; 32]).pubkey());
    }

    #[test]
    fn bytes_roundtrip_through_keypair_layout() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let restored = Keypair::from_bytes(&kp.to_bytes()).unwrap();
        assert_eq!(restored.pubkey(), kp.pubkey());
    }

    #[test]
    fn mismatched_public_half_is_rejected() {
        let mut bytes = keypair_from_seed(&[7u8; 32]).to_bytes();
        bytes[40] ^= 0xFF;
        assert!(matches!(Keypair::from_bytes(&bytes), Err(CryptoError::Mismatch)));
    }

    #[test]
    fn short_input_is_rejected() {
        assert!(matches!(Keypair::from_bytes(&[0u8; 32]), Err(CryptoError::Length(32))));
    }

    #[test]
    fn reads_cli_keypair_file() {
        let kp = keypair_from_seed(&[9u8; 32]);
        let json = serde_json::to_string(&kp.to_bytes().to_vec()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = read_keypair_file(file.path()).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_keypair_file("/nonexistent/id.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/id.json"));
    }
}
