use std::collections::VecDeque;

use solwatch_types::{Pubkey, Signature};

/// Ordered log of human-readable transaction notifications.
///
/// Entries are never deduplicated. With a limit set, the oldest entries are
/// dropped once the log is full.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: VecDeque<String>,
    limit: Option<usize>,
    dropped: u64,
}

impl NotificationLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
            dropped: 0,
        }
    }

    pub fn format(address: &Pubkey, signature: &Signature) -> String {
        format!("New transaction detected on wallet {address}: signature {signature}")
    }

    pub fn push(&mut self, entry: String) {
        if self.limit == Some(0) {
            self.dropped += 1;
            return;
        }
        self.entries.push_back(entry);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
                self.dropped += 1;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries evicted by the limit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_duplicates_in_arrival_order() {
        let mut log = NotificationLog::new(None);
        log.push("a".into());
        log.push("b".into());
        log.push("a".into());
        assert_eq!(log.iter().collect::<Vec<_>>(), ["a", "b", "a"]);
        assert_eq!(log.dropped(), 0);
    }

    #[test]
    fn limit_evicts_oldest() {
        let mut log = NotificationLog::new(Some(2));
        for entry in ["1", "2", "3", "4"] {
            log.push(entry.into());
        }
        assert_eq!(log.iter().collect::<Vec<_>>(), ["3", "4"]);
        assert_eq!(log.dropped(), 2);
    }

    #[test]
    fn message_names_wallet_and_signature() {
        let address = Pubkey::new([0; 32]);
        let signature = Signature::new([0; 64]);
        assert_eq!(
            NotificationLog::format(&address, &signature),
            format!("New transaction detected on wallet {address}: signature {signature}")
        );
        assert!(NotificationLog::format(&address, &signature)
            .starts_with("New transaction detected on wallet 1111"));
    }
}
