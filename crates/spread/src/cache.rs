//! Last-known content per tab.

use std::collections::HashMap;

use smartspread_engine::Fingerprint;

/// Tab name → fingerprint of the grid last read from or written to it.
///
/// Process-local and never persisted. A missing entry means "unknown",
/// so the next write always goes through.
#[derive(Debug, Clone, Default)]
pub struct FingerprintCache {
    entries: HashMap<String, Fingerprint>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab: &str) -> Option<&Fingerprint> {
        self.entries.get(tab)
    }

    pub fn set(&mut self, tab: &str, fingerprint: Fingerprint) {
        self.entries.insert(tab.to_string(), fingerprint);
    }

    pub fn remove(&mut self, tab: &str) -> Option<Fingerprint> {
        self.entries.remove(tab)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
