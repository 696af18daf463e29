//! The database: root of the namespace / sub-namespace / entry graph.
//!
//! [`Database`] exclusively owns its namespaces; namespaces own their
//! sub-namespaces and entries. Every string is duplicated through the
//! database's [`MemoryBudget`] and released exactly once when its owner is
//! erased. Reads hand back owned copies, never references into the store.
//!
//! **Lookup**: namespace by name, then key by name (hash maps)
//! **Mutation**: budget checked first, then the graph is changed, so a `MEM`
//! outcome never leaves a partial update
//! **Queries**: [`Database::execute_query`] parses one command line and calls
//! the same methods

use hashbrown::HashMap;
use tracing::debug;

use crate::budget::{MemoryBudget, StringKind};
use crate::config::Config;
use crate::dispatch::{self, QueryOutput};
use crate::entry::EntryStore;
use crate::error::{StoreError, StoreResult};
use crate::format;
use crate::namespace::Namespace;

/// Which entry store an entry operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// A top-level namespace
    Namespace(&'a str),
    /// A sub-namespace reached through its parent
    SubNamespace { parent: &'a str, sub: &'a str },
}

impl Scope<'_> {
    /// Label used in errors and logs: `ns` or `parent/sub`.
    pub fn label(&self) -> String {
        match self {
            Scope::Namespace(ns) => (*ns).to_string(),
            Scope::SubNamespace { parent, sub } => format!("{parent}/{sub}"),
        }
    }
}

/// Point-in-time counts for a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    pub namespaces: usize,
    pub sub_namespaces: usize,
    /// Entries across namespaces and sub-namespaces
    pub entries: usize,
    /// Bytes of owned names, keys and values
    pub bytes_in_use: u64,
}

/// In-memory, namespace-organized key-value store.
///
/// Single-threaded: mutation goes through `&mut self`, so the borrow checker
/// rules out concurrent writers without any locking.
#[derive(Debug, Clone)]
pub struct Database {
    /// Top-level namespaces; the key is the only copy of the name
    namespaces: HashMap<Box<str>, Namespace>,
    /// Creation counter, gives newest-first listing order
    next_seq: u64,
    /// Owned-string accounting
    budget: MemoryBudget,
    config: Config,
}

impl Database {
    /// Create an empty database with the default configuration.
    pub fn create() -> Self {
        Self::build(Config::default())
    }

    /// Create an empty database after validating `config`.
    pub fn with_config(config: Config) -> StoreResult<Self> {
        config.validate().map_err(StoreError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        debug!(max_memory_bytes = config.max_memory_bytes, "database created");
        Self {
            namespaces: HashMap::new(),
            next_seq: 0,
            budget: MemoryBudget::new(&config),
            config,
        }
    }

    /// Destroy the database, freeing every namespace, sub-namespace and entry.
    ///
    /// Consumes the handle, so it cannot be used afterwards.
    pub fn erase(mut self) {
        let namespaces = self.namespaces.len();
        let mut entries = 0;
        for (name, ns) in self.namespaces.drain() {
            entries += ns.release(&mut self.budget);
            self.budget.release(&name);
        }
        debug!(
            namespaces,
            entries,
            leaked_bytes = self.budget.bytes_in_use(),
            "database erased"
        );
    }

    // -------------------------------------------------------------------
    // Namespaces
    // -------------------------------------------------------------------

    /// Add an empty top-level namespace.
    pub fn create_namespace(&mut self, name: &str) -> StoreResult<()> {
        if self.namespaces.contains_key(name) {
            return Err(StoreError::NamespaceExists(name.to_string()));
        }
        let owned = self.budget.duplicate(StringKind::Name, name)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.namespaces.insert(owned, Namespace::new(seq));
        debug!(namespace = name, "namespace created");
        Ok(())
    }

    /// Add an empty sub-namespace under `parent`.
    pub fn create_sub_namespace(&mut self, parent: &str, sub: &str) -> StoreResult<()> {
        let ns = self
            .namespaces
            .get_mut(parent)
            .ok_or_else(|| StoreError::NamespaceNotFound(parent.to_string()))?;
        ns.create_sub(&mut self.budget, parent, sub)?;
        debug!(parent, sub, "sub-namespace created");
        Ok(())
    }

    /// Remove a top-level namespace and everything it owns.
    pub fn erase_namespace(&mut self, name: &str) -> StoreResult<()> {
        let (owned, ns) = self
            .namespaces
            .remove_entry(name)
            .ok_or_else(|| StoreError::NamespaceNotFound(name.to_string()))?;
        let entries = ns.release(&mut self.budget);
        self.budget.release(&owned);
        debug!(namespace = name, entries, "namespace erased");
        Ok(())
    }

    /// Remove one sub-namespace; its siblings keep their relative order.
    pub fn erase_sub_namespace(&mut self, parent: &str, sub: &str) -> StoreResult<()> {
        let ns = self
            .namespaces
            .get_mut(parent)
            .ok_or_else(|| StoreError::NamespaceNotFound(parent.to_string()))?;
        let entries = ns.erase_sub(&mut self.budget, parent, sub)?;
        debug!(parent, sub, entries, "sub-namespace erased");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Entries
    // -------------------------------------------------------------------

    /// Insert a new key into namespace `ns`. An existing key is `KeyExists`.
    pub fn insert(&mut self, ns: &str, key: &str, value: &str) -> StoreResult<()> {
        self.insert_at(Scope::Namespace(ns), key, value)
    }

    /// Owned copy of the value under `key` in namespace `ns`.
    pub fn get(&self, ns: &str, key: &str) -> StoreResult<String> {
        self.get_at(Scope::Namespace(ns), key)
    }

    /// Replace the value of an existing key in namespace `ns`.
    pub fn update(&mut self, ns: &str, key: &str, value: &str) -> StoreResult<()> {
        self.update_at(Scope::Namespace(ns), key, value)
    }

    /// Remove a key from namespace `ns`.
    pub fn delete(&mut self, ns: &str, key: &str) -> StoreResult<()> {
        self.delete_at(Scope::Namespace(ns), key)
    }

    pub fn insert_at(&mut self, scope: Scope<'_>, key: &str, value: &str) -> StoreResult<()> {
        let label = scope.label();
        let store = resolve_mut(&mut self.namespaces, scope)?;
        store.insert(&mut self.budget, &label, key, value)?;
        debug!(scope = %label, key, "entry inserted");
        Ok(())
    }

    pub fn get_at(&self, scope: Scope<'_>, key: &str) -> StoreResult<String> {
        resolve(&self.namespaces, scope)?.get(&scope.label(), key)
    }

    pub fn update_at(&mut self, scope: Scope<'_>, key: &str, value: &str) -> StoreResult<()> {
        let label = scope.label();
        let store = resolve_mut(&mut self.namespaces, scope)?;
        store.update(&mut self.budget, &label, key, value)?;
        debug!(scope = %label, key, "entry updated");
        Ok(())
    }

    pub fn delete_at(&mut self, scope: Scope<'_>, key: &str) -> StoreResult<()> {
        let label = scope.label();
        let store = resolve_mut(&mut self.namespaces, scope)?;
        store.delete(&mut self.budget, &label, key)?;
        debug!(scope = %label, key, "entry deleted");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Parse and run one query line, e.g. `insert(inventory, sku-1, Widget)`.
    ///
    /// Malformed text, unknown commands and wrong argument counts are
    /// `InvalidQuery` and leave the store untouched.
    pub fn execute_query(&mut self, text: &str) -> StoreResult<QueryOutput> {
        dispatch::execute(self, text)
    }

    // -------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------

    /// Top-level namespace names, newest first.
    pub fn namespace_names(&self) -> Vec<String> {
        self.ordered_namespaces()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Sub-namespace names of `parent`, in creation order.
    pub fn sub_namespace_names(&self, parent: &str) -> StoreResult<Vec<String>> {
        let ns = self
            .namespaces
            .get(parent)
            .ok_or_else(|| StoreError::NamespaceNotFound(parent.to_string()))?;
        Ok(ns.subs().into_iter().map(|(name, _)| name.to_string()).collect())
    }

    /// Keys in the targeted entry store, newest first.
    pub fn keys(&self, scope: Scope<'_>) -> StoreResult<Vec<String>> {
        Ok(resolve(&self.namespaces, scope)?.keys())
    }

    pub fn contains_namespace(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Number of top-level namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// True if there are no namespaces.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            namespaces: self.namespaces.len(),
            sub_namespaces: self.namespaces.values().map(Namespace::sub_count).sum(),
            entries: self.namespaces.values().map(Namespace::total_entries).sum(),
            bytes_in_use: self.budget.bytes_in_use(),
        }
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// CRC32C of the canonical encoding. Equal fingerprints mean equal
    /// contents and equal listing order.
    pub fn fingerprint(&self) -> u32 {
        crc32c::crc32c(&format::encode(self))
    }

    /// Namespaces newest first, with their names.
    pub(crate) fn ordered_namespaces(&self) -> Vec<(&str, &Namespace)> {
        let mut all: Vec<(&str, &Namespace)> =
            self.namespaces.iter().map(|(name, ns)| (&**name, ns)).collect();
        all.sort_unstable_by(|a, b| b.1.seq.cmp(&a.1.seq));
        all
    }
}

impl Default for Database {
    fn default() -> Self { Self::create() }
}

fn resolve<'a>(
    namespaces: &'a HashMap<Box<str>, Namespace>,
    scope: Scope<'_>,
) -> StoreResult<&'a EntryStore> {
    match scope {
        Scope::Namespace(ns) => namespaces
            .get(ns)
            .map(Namespace::entries)
            .ok_or_else(|| StoreError::NamespaceNotFound(ns.to_string())),
        Scope::SubNamespace { parent, sub } => {
            let ns = namespaces
                .get(parent)
                .ok_or_else(|| StoreError::NamespaceNotFound(parent.to_string()))?;
            ns.sub(sub)
                .map(|s| s.entries())
                .ok_or_else(|| StoreError::SubNamespaceNotFound {
                    parent: parent.to_string(),
                    sub: sub.to_string(),
                })
        }
    }
}

fn resolve_mut<'a>(
    namespaces: &'a mut HashMap<Box<str>, Namespace>,
    scope: Scope<'_>,
) -> StoreResult<&'a mut EntryStore> {
    match scope {
        Scope::Namespace(ns) => namespaces
            .get_mut(ns)
            .map(Namespace::entries_mut)
            .ok_or_else(|| StoreError::NamespaceNotFound(ns.to_string())),
        Scope::SubNamespace { parent, sub } => {
            let ns = namespaces
                .get_mut(parent)
                .ok_or_else(|| StoreError::NamespaceNotFound(parent.to_string()))?;
            Ok(ns.sub_mut(parent, sub)?.entries_mut())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let mut db = Database::create();
        db.create_namespace("inventory").unwrap();
        db
    }

    #[test]
    fn test_create_empty() {
        let db = Database::create();
        assert!(db.is_empty());
        assert_eq!(db.stats(), DatabaseStats::default());
    }

    #[test]
    fn test_with_invalid_config() {
        let mut config = Config::budget();
        config.max_value_size = 0;
        let err = Database::with_config(config).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_namespace_uniqueness() {
        let mut db = test_db();
        assert_eq!(
            db.create_namespace("inventory"),
            Err(StoreError::NamespaceExists("inventory".into()))
        );
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_namespaces_newest_first() {
        let mut db = Database::create();
        for name in ["a", "b", "c"] {
            db.create_namespace(name).unwrap();
        }
        assert_eq!(db.namespace_names(), vec!["c", "b", "a"]);
        db.erase_namespace("b").unwrap();
        assert_eq!(db.namespace_names(), vec!["c", "a"]);
    }

    #[test]
    fn test_put_get_update_delete() {
        let mut db = test_db();
        db.insert("inventory", "sku-1", "Widget").unwrap();
        assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget");

        db.update("inventory", "sku-1", "Widget-v2").unwrap();
        assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget-v2");

        db.delete("inventory", "sku-1").unwrap();
        assert!(matches!(
            db.get("inventory", "sku-1"),
            Err(StoreError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_entry_ops_on_missing_namespace() {
        let mut db = Database::create();
        let missing = Err(StoreError::NamespaceNotFound("nope".into()));
        assert_eq!(db.insert("nope", "k", "v"), missing);
        assert_eq!(db.update("nope", "k", "v"), missing);
        assert_eq!(db.delete("nope", "k"), missing);
        assert_eq!(db.get("nope", "k").map(|_| ()), missing);
    }

    #[test]
    fn test_insert_existing_key() {
        let mut db = test_db();
        db.insert("inventory", "k", "v1").unwrap();
        assert_eq!(
            db.insert("inventory", "k", "v2"),
            Err(StoreError::KeyExists { namespace: "inventory".into(), key: "k".into() })
        );
        assert_eq!(db.get("inventory", "k").unwrap(), "v1");
    }

    #[test]
    fn test_get_returns_owned_copy() {
        let mut db = test_db();
        db.insert("inventory", "k", "v").unwrap();
        let mut copy = db.get("inventory", "k").unwrap();
        copy.push_str("-mutated");
        assert_eq!(db.get("inventory", "k").unwrap(), "v");
    }

    #[test]
    fn test_sub_namespace_errors() {
        let mut db = test_db();
        assert!(matches!(
            db.create_sub_namespace("missing", "x"),
            Err(StoreError::NamespaceNotFound(_))
        ));
        db.create_sub_namespace("inventory", "electronics").unwrap();
        assert!(matches!(
            db.create_sub_namespace("inventory", "electronics"),
            Err(StoreError::SubNamespaceExists { .. })
        ));
        assert!(matches!(
            db.erase_sub_namespace("inventory", "books"),
            Err(StoreError::SubNamespaceNotFound { .. })
        ));
        assert!(matches!(
            db.erase_sub_namespace("missing", "books"),
            Err(StoreError::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn test_scoped_entries() {
        let mut db = test_db();
        db.create_sub_namespace("inventory", "electronics").unwrap();
        let sub = Scope::SubNamespace { parent: "inventory", sub: "electronics" };

        db.insert_at(sub, "tv", "OLED").unwrap();
        assert_eq!(db.get_at(sub, "tv").unwrap(), "OLED");
        // Parent and sub-namespace stores are separate.
        assert!(db.get("inventory", "tv").is_err());

        db.update_at(sub, "tv", "QLED").unwrap();
        assert_eq!(db.keys(sub).unwrap(), vec!["tv"]);
        db.delete_at(sub, "tv").unwrap();
        assert_eq!(
            db.get_at(sub, "tv"),
            Err(StoreError::KeyNotFound { namespace: "inventory/electronics".into(), key: "tv".into() })
        );

        let missing = Scope::SubNamespace { parent: "inventory", sub: "books" };
        assert!(matches!(db.insert_at(missing, "k", "v"), Err(StoreError::SubNamespaceNotFound { .. })));
    }

    #[test]
    fn test_erase_namespace_releases_bytes() {
        let mut db = test_db();
        db.create_sub_namespace("inventory", "electronics").unwrap();
        db.insert("inventory", "k", "v").unwrap();
        db.insert_at(Scope::SubNamespace { parent: "inventory", sub: "electronics" }, "k", "v")
            .unwrap();
        assert_eq!(db.stats().entries, 2);
        assert_eq!(db.stats().sub_namespaces, 1);

        db.erase_namespace("inventory").unwrap();
        assert!(db.is_empty());
        assert_eq!(db.budget().bytes_in_use(), 0);
        assert_eq!(db.budget().allocations(), db.budget().releases());
        assert!(matches!(db.erase_namespace("inventory"), Err(StoreError::NamespaceNotFound(_))));
    }

    #[test]
    fn test_mem_leaves_graph_unchanged() {
        let mut db = Database::with_config(Config {
            max_memory_bytes: 32,
            max_name_size: 16,
            max_key_size: 16,
            max_value_size: 32,
        })
        .unwrap();
        db.create_namespace("inventory").unwrap();
        let before = db.fingerprint();

        let err = db.insert("inventory", "sku", "a value that is far too long").unwrap_err();
        assert!(matches!(err, StoreError::Mem { .. }));
        assert_eq!(db.fingerprint(), before);
        assert!(db.keys(Scope::Namespace("inventory")).unwrap().is_empty());

        let long_name = "x".repeat(17);
        assert!(matches!(db.create_namespace(&long_name), Err(StoreError::Mem { .. })));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_erase_consumes() {
        let mut db = test_db();
        db.insert("inventory", "k", "v").unwrap();
        db.erase();
    }
}
