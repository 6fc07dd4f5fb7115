use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::core::palindrome::Palindrome;
use crate::core::types::SearchStrategy;
use crate::search::SearchError;

/// Palindromes found in one sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceResult {
    pub sequence_name: String,
    pub length: usize,
    pub strategy: SearchStrategy,
    pub palindromes: Vec<Palindrome>,
}

/// Handle to a reserved sequence name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot(u64);

#[derive(Debug, Default)]
struct StoreInner {
    /// Index: sequence name -> slot, for reserved and filled names
    name_to_slot: HashMap<String, Slot>,
    /// Finished results; slots increase with every reservation
    results: BTreeMap<Slot, SequenceResult>,
    next_slot: u64,
}

impl StoreInner {
    fn remove_if_unfilled(&mut self, name: &str) {
        if let Some(slot) = self.name_to_slot.get(name) {
            if !self.results.contains_key(slot) {
                self.name_to_slot.remove(name);
            }
        }
    }
}

/// Results keyed by sequence name, in the order names were reserved.
///
/// A name is reserved before its search starts so that two searches for the
/// same name can never both run; the reservation and the duplicate check
/// happen under one lock. Releasing a reservation leaves nothing behind.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<StoreInner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DuplicateSequence`] if the name is reserved or
    /// already has a result.
    pub fn reserve(&self, name: &str) -> Result<Slot, SearchError> {
        let mut inner = self.lock();
        if inner.name_to_slot.contains_key(name) {
            return Err(SearchError::DuplicateSequence(name.to_string()));
        }

        let slot = Slot(inner.next_slot);
        inner.next_slot += 1;
        inner.name_to_slot.insert(name.to_string(), slot);
        Ok(slot)
    }

    /// Store the result for a reserved slot
    pub fn fill(&self, slot: Slot, result: SequenceResult) {
        self.lock().results.insert(slot, result);
    }

    /// Release a reservation whose search failed
    pub fn release(&self, name: &str) {
        self.lock().remove_if_unfilled(name);
    }

    /// Release every one of `names` that has no result yet
    pub fn release_unfilled<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let mut inner = self.lock();
        for name in names {
            inner.remove_if_unfilled(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().name_to_slot.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<SequenceResult> {
        let inner = self.lock();
        let slot = inner.name_to_slot.get(name)?;
        inner.results.get(slot).cloned()
    }

    /// Every finished result in reservation order
    pub fn results(&self) -> Vec<SequenceResult> {
        self.lock().results.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_result(name: &str) -> SequenceResult {
        SequenceResult {
            sequence_name: name.to_string(),
            length: 0,
            strategy: SearchStrategy::Scan,
            palindromes: Vec::new(),
        }
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let store = ResultStore::new();
        store.reserve("c_1").unwrap();
        assert!(matches!(
            store.reserve("c_1"),
            Err(SearchError::DuplicateSequence(name)) if name == "c_1"
        ));
    }

    #[test]
    fn test_results_keep_reservation_order() {
        let store = ResultStore::new();
        let first = store.reserve("b").unwrap();
        let second = store.reserve("a").unwrap();
        store.fill(second, empty_result("a"));
        store.fill(first, empty_result("b"));

        let names: Vec<String> = store
            .results()
            .into_iter()
            .map(|r| r.sequence_name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(store.get("a").is_some());
    }

    #[test]
    fn test_release_allows_retry() {
        let store = ResultStore::new();
        store.reserve("c_1").unwrap();
        store.release("c_1");
        assert!(!store.contains("c_1"));
        assert!(store.reserve("c_1").is_ok());
    }

    #[test]
    fn test_release_keeps_filled_results() {
        let store = ResultStore::new();
        let slot = store.reserve("done").unwrap();
        store.fill(slot, empty_result("done"));
        store.reserve("pending").unwrap();

        store.release_unfilled(["done", "pending"]);

        assert!(store.contains("done"));
        assert!(!store.contains("pending"));
        assert_eq!(store.results().len(), 1);
        assert!(matches!(
            store.reserve("done"),
            Err(SearchError::DuplicateSequence(_))
        ));
    }

    #[test]
    fn test_released_slots_leave_no_entries() {
        let store = ResultStore::new();
        for _ in 0..100 {
            store.reserve("retry").unwrap();
            store.release("retry");
        }
        let slot = store.reserve("retry").unwrap();
        store.fill(slot, empty_result("retry"));

        assert_eq!(store.results().len(), 1);
        assert_eq!(store.lock().results.len(), 1);
        assert_eq!(store.lock().name_to_slot.len(), 1);
    }

    #[test]
    fn test_concurrent_reservations_admit_one() {
        let store = ResultStore::new();
        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.reserve("shared").is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });
        assert_eq!(successes, 1);
    }
}
