//! Preference storage for solwatch.
//!
//! The rest of the codebase depends only on the [`PreferenceStore`] trait.
//! [`FilePreferenceStore`] persists to a TOML file; an in-memory
//! implementation for tests lives in `solwatch-nullables`.

pub mod error;
pub mod file;
pub mod preferences;

pub use error::StoreError;
pub use file::FilePreferenceStore;
pub use preferences::{PreferenceStore, NETWORK_KEY};
