//! Legacy message compilation and serialization.

use solwatch_types::{Blockhash, Pubkey};

use crate::compact::encode_len;
use crate::error::TransactionError;
use crate::instruction::{CompiledInstruction, Instruction};

/// Counts that tell the runtime how to read the account key table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// The signed portion of a transaction.
///
/// Account keys are ordered signer-writable, signer-readonly,
/// unsigned-writable, unsigned-readonly, with the fee payer first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Clone, Copy)]
struct KeyFlags {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl Message {
    /// Compile `instructions` paid for by `payer`.
    pub fn new(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: Blockhash,
    ) -> Result<Self, TransactionError> {
        let mut keys: Vec<KeyFlags> = vec![KeyFlags {
            pubkey: *payer,
            is_signer: true,
            is_writable: true,
        }];
        let mut merge = |pubkey: Pubkey, is_signer: bool, is_writable: bool| {
            match keys.iter_mut().find(|k| k.pubkey == pubkey) {
                Some(existing) => {
                    existing.is_signer |= is_signer;
                    existing.is_writable |= is_writable;
                }
                None => keys.push(KeyFlags {
                    pubkey,
                    is_signer,
                    is_writable,
                }),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            merge(ix.program_id, false, false);
        }

        // Stable sort keeps the payer ahead of other writable signers.
        keys.sort_by_key(|k| match (k.is_signer, k.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if keys.len() > usize::from(u8::MAX) {
            return Err(TransactionError::TooMany {
                what: "account keys",
                count: keys.len(),
            });
        }

        let count = |signer: bool, writable: bool| {
            keys.iter()
                .filter(|k| k.is_signer == signer && k.is_writable == writable)
                .count() as u8
        };
        let header = MessageHeader {
            num_required_signatures: count(true, true) + count(true, false),
            num_readonly_signed_accounts: count(true, false),
            num_readonly_unsigned_accounts: count(false, false),
        };

        let account_keys: Vec<Pubkey> = keys.iter().map(|k| k.pubkey).collect();
        let index_of = |pubkey: &Pubkey| {
            account_keys
                .iter()
                .position(|k| k == pubkey)
                .map(|i| i as u8)
                .expect("every referenced key was merged into the table")
        };
        let instructions = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    /// Keys whose signatures the transaction must carry, in signature order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..usize::from(self.header.num_required_signatures)]
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.first()
    }

    /// The bytes that signers sign.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_len(self.account_keys.len() as u16, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(self.recent_blockhash.as_bytes());

        encode_len(self.instructions.len() as u16, &mut out);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_len(ix.accounts.len() as u16, &mut out);
            out.extend_from_slice(&ix.accounts);
            encode_len(ix.data.len() as u16, &mut out);
            out.extend_from_slice(&ix.data);
        }
        out
    }
}
