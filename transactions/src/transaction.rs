//! The signature envelope around a message.

use solwatch_types::{Pubkey, Signature};

use crate::compact::encode_len;
use crate::error::TransactionError;
use crate::message::Message;

/// A message plus one signature slot per required signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    signatures: Vec<Signature>,
    message: Message,
}

impl Transaction {
    /// Wrap `message` with empty signature slots.
    pub fn new_unsigned(message: Message) -> Self {
        let slots = usize::from(message.header.num_required_signatures);
        Self {
            signatures: vec![Signature::DEFAULT; slots],
            message,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The fee payer's signature, which identifies the transaction on chain.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first().filter(|s| **s != Signature::DEFAULT)
    }

    /// Place `signature` in the slot belonging to `signer`.
    pub fn add_signature(
        &mut self,
        signer: &Pubkey,
        signature: Signature,
    ) -> Result<(), TransactionError> {
        let idx = self
            .message
            .signer_keys()
            .iter()
            .position(|k| k == signer)
            .ok_or(TransactionError::UnknownSigner(*signer))?;
        self.signatures[idx] = signature;
        Ok(())
    }

    pub fn missing_signatures(&self) -> usize {
        self.signatures
            .iter()
            .filter(|s| **s == Signature::DEFAULT)
            .count()
    }

    /// Wire encoding submitted to the cluster. Every slot must be signed.
    pub fn serialize(&self) -> Result<Vec<u8>, TransactionError> {
        let missing = self.missing_signatures();
        if missing > 0 {
            return Err(TransactionError::MissingSignatures { missing });
        }
        let message = self.message.serialize();
        let capacity = 1 + self.signatures.len() * Signature::LEN + message.len();
        let mut out = Vec::with_capacity(capacity);
        encode_len(self.signatures.len() as u16, &mut out);
        for sig in &self.signatures {
            out.extend_from_slice(sig.as_bytes());
        }
        out.extend_from_slice(&message);
        Ok(out)
    }
}
