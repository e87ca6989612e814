//! Commitment levels for queries and subscriptions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// How deep in the chain a result must be before it is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// Whether a signature status reported at `status` satisfies this level.
    pub fn is_satisfied_by(&self, status: Commitment) -> bool {
        status >= *self
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(TypeError::UnknownCommitment(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalized_satisfies_confirmed() {
        assert!(Commitment::Confirmed.is_satisfied_by(Commitment::Finalized));
        assert!(Commitment::Confirmed.is_satisfied_by(Commitment::Confirmed));
        assert!(!Commitment::Confirmed.is_satisfied_by(Commitment::Processed));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Confirmed".parse::<Commitment>().unwrap(), Commitment::Confirmed);
        assert!("safe".parse::<Commitment>().is_err());
    }
}
