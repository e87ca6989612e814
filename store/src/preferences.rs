//! Key/value preference storage.

use crate::StoreError;

/// Key under which the last selected network is stored.
pub const NETWORK_KEY: &str = "solana-network";

/// A small string key/value store that survives restarts.
pub trait PreferenceStore: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
