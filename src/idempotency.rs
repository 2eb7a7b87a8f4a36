use parking_lot::Mutex;
use std::collections::HashSet;

/// Admission-time dedup set. IDs are inserted on first sight and removed once
/// the consumer has successfully processed them, so the dedup window is
/// effectively "time-in-flight" rather than permanent (spec.md §9 Open
/// Questions, resolved in DESIGN.md).
pub struct IdempotencyStore {
    seen: Mutex<HashSet<String>>,
}

impl IdempotencyStore {
    pub fn new() -> Self {
        Self { seen: Mutex::new(HashSet::new()) }
    }

    /// Returns whether `id` had already been admitted. Inserts on first sight.
    pub fn already_processed(&self, id: &str) -> bool {
        let mut seen = self.seen.lock();
        !seen.insert(id.to_string())
    }

    pub fn remove_processed(&self, id: &str) {
        self.seen.lock().remove(id);
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl Default for IdempotencyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sight_is_not_duplicate_second_is() {
        let store = IdempotencyStore::new();
        assert!(!store.already_processed("a"));
        assert!(store.already_processed("a"));
    }

    #[test]
    fn remove_allows_readmission() {
        let store = IdempotencyStore::new();
        assert!(!store.already_processed("a"));
        store.remove_processed("a");
        assert!(!store.already_processed("a"));
    }

    #[test]
    fn clear_forgets_everything() {
        let store = IdempotencyStore::new();
        store.already_processed("a");
        store.already_processed("b");
        store.clear();
        assert!(!store.already_processed("a"));
        assert!(!store.already_processed("b"));
    }
}
