//! Memory budget: the string duplication primitive
//!
//! Every name, key and value the store keeps is copied into owned memory
//! through [`MemoryBudget`]. The budget checks the configured limits BEFORE
//! allocating, so a refused call never leaves a partial mutation behind, and
//! tracks the bytes currently held so erasures hand them back.

use tracing::warn;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};

/// What an owned string is used for; selects the per-string size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// Namespace or sub-namespace name
    Name,
    /// Entry key
    Key,
    /// Entry value
    Value,
}

impl StringKind {
    fn label(self) -> &'static str {
        match self {
            StringKind::Name => "name size limit",
            StringKind::Key => "key size limit",
            StringKind::Value => "value size limit",
        }
    }
}

/// Byte accounting for all strings owned by one database.
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    limit: u64,
    max_name_size: usize,
    max_key_size: usize,
    max_value_size: usize,
    in_use: u64,
    allocations: u64,
    releases: u64,
}

impl MemoryBudget {
    /// Create an empty budget with the limits from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            limit: config.max_memory_bytes,
            max_name_size: config.max_name_size,
            max_key_size: config.max_key_size,
            max_value_size: config.max_value_size,
            in_use: 0,
            allocations: 0,
            releases: 0,
        }
    }

    /// Check that `strings` can all be duplicated once `freed` bytes have
    /// been handed back. Nothing is charged.
    pub fn reserve(&self, strings: &[(StringKind, &str)], freed: u64) -> StoreResult<()> {
        let mut requested: u64 = 0;
        for (kind, s) in strings {
            let max = self.max_size(*kind);
            if s.len() > max {
                warn!(kind = ?kind, len = s.len(), max, "string exceeds size limit");
                return Err(StoreError::Mem {
                    requested: s.len() as u64,
                    available: max as u64,
                    reason: kind.label(),
                });
            }
            requested = requested.saturating_add(s.len() as u64);
        }

        let available = self.available().saturating_add(freed);
        if requested > available {
            warn!(requested, available, "memory budget exhausted");
            return Err(StoreError::Mem {
                requested,
                available,
                reason: "total budget",
            });
        }
        Ok(())
    }

    /// Duplicate one string into owned memory, charging the budget.
    pub fn duplicate(&mut self, kind: StringKind, s: &str) -> StoreResult<Box<str>> {
        self.reserve(&[(kind, s)], 0)?;
        Ok(self.charge(s))
    }

    /// Duplicate a string whose space was already checked with [`reserve`].
    ///
    /// [`reserve`]: MemoryBudget::reserve
    pub(crate) fn charge(&mut self, s: &str) -> Box<str> {
        self.in_use = self.in_use.saturating_add(s.len() as u64);
        self.allocations += 1;
        Box::from(s)
    }

    /// Hand back the bytes of an owned string that is being freed.
    pub fn release(&mut self, s: &str) {
        self.in_use = self.in_use.saturating_sub(s.len() as u64);
        self.releases += 1;
    }

    /// Bytes of owned strings currently held.
    pub fn bytes_in_use(&self) -> u64 {
        self.in_use
    }

    /// Bytes left under the total limit.
    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.in_use)
    }

    /// Strings duplicated since creation.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Strings freed since creation.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    fn max_size(&self, kind: StringKind) -> usize {
        match kind {
            StringKind::Name => self.max_name_size,
            StringKind::Key => self.max_key_size,
            StringKind::Value => self.max_value_size,
        }
    }
}
