use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per key, created on demand. Serializes writers of the same
/// session (or the same candidate/test pair) without a global lock.
#[derive(Debug)]
pub(crate) struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub(crate) fn slot(&self, key: &K) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `op` while holding the key's mutex.
    pub(crate) fn run<T>(&self, key: &K, op: impl FnOnce() -> T) -> T {
        let slot = self.slot(key);
        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            op()
        };
        drop(slot);
        self.release(key);
        result
    }

    /// Drop the slot once nobody else holds it.
    pub(crate) fn release(&self, key: &K) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(key)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false)
        {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_shares_a_slot() {
        let locks = KeyedLocks::default();
        let first = locks.slot(&"ses-1".to_string());
        let second = locks.slot(&"ses-1".to_string());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn release_keeps_slots_still_in_use() {
        let locks = KeyedLocks::default();
        let key = "ses-2".to_string();
        let held = locks.slot(&key);
        locks.release(&key);
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.release(&key);
        assert_eq!(locks.len(), 0);
    }
}
