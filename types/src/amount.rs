//! Native token amounts.
//!
//! Amounts are held as integer lamports to avoid floating-point errors.
//! One SOL is `LAMPORTS_PER_SOL` lamports; user input in SOL is parsed
//! exactly by [`Lamports::from_sol_str`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypeError;

/// Lamports per whole SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Maximum number of fractional digits a SOL amount can carry.
const SOL_DECIMALS: usize = 9;

/// An amount of the native token in its smallest unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Lamports(u64);

impl Lamports {
    pub const ZERO: Self = Self(0);

    pub const fn new(lamports: u64) -> Self {
        Self(lamports)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Parse a decimal SOL quantity such as `"1.25"` or `".5"` into lamports.
    ///
    /// Signs are rejected; callers deciding on positivity look at the raw
    /// input themselves.
    pub fn from_sol_str(input: &str) -> Result<Self, TypeError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TypeError::InvalidAmount("amount is empty".into()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(TypeError::InvalidAmount(s.to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(TypeError::InvalidAmount(s.to_string()));
        }
        if frac.len() > SOL_DECIMALS {
            return Err(TypeError::TooPrecise { max: SOL_DECIMALS });
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| TypeError::AmountOverflow)?
        };
        let mut frac_lamports: u64 = 0;
        for digit in frac.bytes().chain(std::iter::repeat(b'0')).take(SOL_DECIMALS) {
            frac_lamports = frac_lamports * 10 + u64::from(digit - b'0');
        }

        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|w| w.checked_add(frac_lamports))
            .map(Self)
            .ok_or(TypeError::AmountOverflow)
    }

    /// Render in whole-token units without the unit suffix, e.g. `"1.5"`.
    pub fn to_sol_string(&self) -> String {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let frac = self.0 % LAMPORTS_PER_SOL;
        if frac == 0 {
            return whole.to_string();
        }
        let digits = format!("{:09}", frac);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl From<u64> for Lamports {
    fn from(lamports: u64) -> Self {
        Self(lamports)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.to_sol_string())
    }
}
