//! Selection between several configured wallets.

use std::sync::Arc;

use crate::adapter::WalletAdapter;
use crate::error::WalletError;

/// The wallets offered to the user and which one is selected.
#[derive(Default, Clone)]
pub struct WalletRegistry {
    adapters: Vec<Arc<dyn WalletAdapter>>,
    selected: Option<usize>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. The first one registered becomes the selection.
    pub fn register(&mut self, adapter: Arc<dyn WalletAdapter>) {
        self.adapters.push(adapter);
        if self.selected.is_none() {
            self.selected = Some(0);
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Select the adapter called `name` (case-insensitive).
    pub fn select(&mut self, name: &str) -> Result<Arc<dyn WalletAdapter>, WalletError> {
        let idx = self
            .adapters
            .iter()
            .position(|a| a.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| WalletError::UnknownWallet(name.to_string()))?;
        self.selected = Some(idx);
        Ok(self.adapters[idx].clone())
    }

    pub fn selected(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.selected.map(|idx| self.adapters[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeypairWallet;
    use solwatch_crypto::keypair_from_seed;

    fn registry() -> WalletRegistry {
        let mut registry = WalletRegistry::new();
        registry.register(Arc::new(KeypairWallet::new("Primary", keypair_from_seed(&[1; 32]))));
        registry.register(Arc::new(KeypairWallet::new("Backup", keypair_from_seed(&[2; 32]))));
        registry
    }

    #[test]
    fn first_registered_is_selected() {
        let registry = registry();
        assert_eq!(registry.selected().unwrap().name(), "Primary");
        assert_eq!(registry.names(), vec!["Primary", "Backup"]);
    }

    #[test]
    fn select_by_name_ignores_case() {
        let mut registry = registry();
        assert_eq!(registry.select("backup").unwrap().name(), "Backup");
        assert_eq!(registry.selected().unwrap().name(), "Backup");
    }

    #[test]
    fn unknown_name_keeps_selection() {
        let mut registry = registry();
        assert!(matches!(registry.select("phantom"), Err(WalletError::UnknownWallet(_))));
        assert_eq!(registry.selected().unwrap().name(), "Primary");
    }

    #[test]
    fn empty_registry_has_no_selection() {
        assert!(WalletRegistry::new().selected().is_none());
    }
}
