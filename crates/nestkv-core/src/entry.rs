//! Entry store: the key/value pairs owned by one namespace.
//!
//! Keys are unique by construction (they are the map keys). Each slot also
//! carries the sequence number it was inserted with so listings come back
//! newest first, the order a front-inserted list would give.

use hashbrown::HashMap;

use crate::budget::{MemoryBudget, StringKind};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Slot {
    value: Box<str>,
    seq: u64,
}

/// Owned, key-addressable set of entries.
///
/// Every method that allocates or frees takes the owning database's
/// [`MemoryBudget`]. `owner` is only used to label errors.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    slots: HashMap<Box<str>, Slot>,
    next_seq: u64,
}

impl EntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new entry. An existing key is reported as `KeyExists` and left untouched.
    pub fn insert(
        &mut self,
        budget: &mut MemoryBudget,
        owner: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<()> {
        if self.slots.contains_key(key) {
            return Err(StoreError::KeyExists {
                namespace: owner.to_string(),
                key: key.to_string(),
            });
        }
        budget.reserve(&[(StringKind::Key, key), (StringKind::Value, value)], 0)?;

        let key = budget.charge(key);
        let value = budget.charge(value);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(key, Slot { value, seq });
        Ok(())
    }

    /// Caller-owned copy of the value stored under `key`.
    pub fn get(&self, owner: &str, key: &str) -> StoreResult<String> {
        self.slots
            .get(key)
            .map(|slot| slot.value.to_string())
            .ok_or_else(|| key_not_found(owner, key))
    }

    /// Replace the value of an existing key in place.
    pub fn update(
        &mut self,
        budget: &mut MemoryBudget,
        owner: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<()> {
        let slot = self.slots.get_mut(key).ok_or_else(|| key_not_found(owner, key))?;
        budget.reserve(&[(StringKind::Value, value)], slot.value.len() as u64)?;

        budget.release(&slot.value);
        slot.value = budget.charge(value);
        Ok(())
    }

    /// Remove an entry, freeing its key and value.
    pub fn delete(&mut self, budget: &mut MemoryBudget, owner: &str, key: &str) -> StoreResult<()> {
        let (key, slot) = self
            .slots
            .remove_entry(key)
            .ok_or_else(|| key_not_found(owner, key))?;
        budget.release(&key);
        budget.release(&slot.value);
        Ok(())
    }

    /// Free every entry. Returns how many were removed.
    pub fn clear(&mut self, budget: &mut MemoryBudget) -> usize {
        let removed = self.slots.len();
        for (key, slot) in self.slots.drain() {
            budget.release(&key);
            budget.release(&slot.value);
        }
        removed
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys, newest first.
    pub fn keys(&self) -> Vec<String> {
        self.ordered().into_iter().map(|(k, _)| k.to_string()).collect()
    }

    /// Borrowed `(key, value)` pairs, newest first.
    pub(crate) fn ordered(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(u64, &str, &str)> = self
            .slots
            .iter()
            .map(|(k, slot)| (slot.seq, &**k, &*slot.value))
            .collect();
        pairs.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        pairs.into_iter().map(|(_, k, v)| (k, v)).collect()
    }
}

fn key_not_found(owner: &str, key: &str) -> StoreError {
    StoreError::KeyNotFound {
        namespace: owner.to_string(),
        key: key.to_string(),
    }
}
