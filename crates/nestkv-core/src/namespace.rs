//! Namespaces and their one level of sub-namespaces.
//!
//! A [`Namespace`] owns a name-keyed map of [`SubNamespace`]s and an
//! [`EntryStore`]. A sub-namespace has an entry store but no children, so
//! nesting deeper than one level cannot be represented.
//!
//! Names are owned by the map that holds the value (the database map for a
//! namespace, the parent's map for a sub-namespace), so each name is stored
//! exactly once. Methods that report errors take the parent name as a label.

use hashbrown::HashMap;

use crate::budget::{MemoryBudget, StringKind};
use crate::entry::EntryStore;
use crate::error::{StoreError, StoreResult};

/// A sub-namespace: its own entries and its creation position.
#[derive(Debug, Clone, Default)]
pub struct SubNamespace {
    entries: EntryStore,
    seq: u64,
}

impl SubNamespace {
    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut EntryStore {
        &mut self.entries
    }
}

/// A top-level namespace.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    subs: HashMap<Box<str>, SubNamespace>,
    next_sub_seq: u64,
    entries: EntryStore,
    pub(crate) seq: u64,
}

impl Namespace {
    pub(crate) fn new(seq: u64) -> Self {
        Self { seq, ..Self::default() }
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut EntryStore {
        &mut self.entries
    }

    /// Add an empty sub-namespace at the end of the collection.
    pub(crate) fn create_sub(
        &mut self,
        budget: &mut MemoryBudget,
        parent: &str,
        sub: &str,
    ) -> StoreResult<()> {
        if self.subs.contains_key(sub) {
            return Err(StoreError::SubNamespaceExists {
                parent: parent.to_string(),
                sub: sub.to_string(),
            });
        }
        let name = budget.duplicate(StringKind::Name, sub)?;
        let seq = self.next_sub_seq;
        self.next_sub_seq += 1;
        self.subs.insert(name, SubNamespace { entries: EntryStore::new(), seq });
        Ok(())
    }

    /// Remove a sub-namespace and free everything it owns.
    ///
    /// Returns the number of entries freed with it.
    pub(crate) fn erase_sub(
        &mut self,
        budget: &mut MemoryBudget,
        parent: &str,
        sub: &str,
    ) -> StoreResult<usize> {
        let (name, mut removed) = self
            .subs
            .remove_entry(sub)
            .ok_or_else(|| sub_not_found(parent, sub))?;
        let freed = removed.entries.clear(budget);
        budget.release(&name);
        Ok(freed)
    }

    pub fn sub(&self, sub: &str) -> Option<&SubNamespace> {
        self.subs.get(sub)
    }

    pub(crate) fn sub_mut(&mut self, parent: &str, sub: &str) -> StoreResult<&mut SubNamespace> {
        self.subs.get_mut(sub).ok_or_else(|| sub_not_found(parent, sub))
    }

    /// Sub-namespaces in creation order.
    pub fn subs(&self) -> Vec<(&str, &SubNamespace)> {
        let mut subs: Vec<(&str, &SubNamespace)> =
            self.subs.iter().map(|(name, sub)| (&**name, sub)).collect();
        subs.sort_unstable_by_key(|(_, sub)| sub.seq);
        subs
    }

    pub fn sub_count(&self) -> usize {
        self.subs.len()
    }

    /// Entries held by this namespace and all of its sub-namespaces.
    pub fn total_entries(&self) -> usize {
        self.entries.len() + self.subs.values().map(|s| s.entries.len()).sum::<usize>()
    }

    /// Free every sub-namespace and every entry. The caller frees the name.
    ///
    /// Returns the number of entries freed, sub-namespace entries included.
    pub(crate) fn release(mut self, budget: &mut MemoryBudget) -> usize {
        let mut freed = self.entries.clear(budget);
        for (name, mut sub) in self.subs.drain() {
            freed += sub.entries.clear(budget);
            budget.release(&name);
        }
        freed
    }
}

fn sub_not_found(parent: &str, sub: &str) -> StoreError {
    StoreError::SubNamespaceNotFound {
        parent: parent.to_string(),
        sub: sub.to_string(),
    }
}
