//! System program instructions.

use solwatch_types::{Lamports, Pubkey};

use crate::error::TransactionError;
use crate::instruction::{AccountMeta, Instruction};

/// Index of `Transfer` in the system program's instruction enum.
const TRANSFER_DISCRIMINANT: u32 = 2;

/// Build a native-token transfer of `lamports` from `from` to `to`.
pub fn transfer(
    from: &Pubkey,
    to: &Pubkey,
    lamports: Lamports,
) -> Result<Instruction, TransactionError> {
    if lamports.is_zero() {
        return Err(TransactionError::ZeroAmount);
    }

    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_DISCRIMINANT.to_le_bytes());
    data.extend_from_slice(&lamports.get().to_le_bytes());

    Ok(Instruction {
        program_id: Pubkey::SYSTEM_PROGRAM,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_data_layout() {
        let ix =
            transfer(&Pubkey::new([1; 32]), &Pubkey::new([2; 32]), Lamports::new(1_000)).unwrap();
        assert_eq!(ix.program_id, Pubkey::SYSTEM_PROGRAM);
        assert_eq!(ix.data, vec![2, 0, 0, 0, 0xe8, 0x03, 0, 0, 0, 0, 0, 0]);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
    }

    #[test]
    fn zero_transfer_is_rejected() {
        let err =
            transfer(&Pubkey::new([1; 32]), &Pubkey::new([2; 32]), Lamports::ZERO).unwrap_err();
        assert_eq!(err, TransactionError::ZeroAmount);
    }
}
