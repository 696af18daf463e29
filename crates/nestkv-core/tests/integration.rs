//! Integration tests: the public Database API and the query dispatcher
//! driven together, the way an embedding application uses them.

use nestkv_core::{Config, Database, QueryOutput, ResultKind, Scope, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn inventory_db() -> Database {
    let mut db = Database::create();
    db.create_namespace("inventory").unwrap();
    db
}

fn kind<T>(result: &Result<T, StoreError>) -> ResultKind {
    ResultKind::of(result)
}

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

#[test]
fn test_namespace_create_twice() {
    let mut db = Database::create();
    assert_eq!(kind(&db.create_namespace("inventory")), ResultKind::Ok);
    assert_eq!(kind(&db.create_namespace("inventory")), ResultKind::NsExists);
}

#[test]
fn test_sub_namespace_lifecycle() {
    let mut db = inventory_db();
    assert_eq!(kind(&db.create_sub_namespace("inventory", "electronics")), ResultKind::Ok);
    assert_eq!(kind(&db.create_sub_namespace("inventory", "electronics")), ResultKind::SubNsExists);
    assert_eq!(kind(&db.create_sub_namespace("missing", "x")), ResultKind::NsNotFound);

    db.create_sub_namespace("inventory", "books").unwrap();
    db.create_sub_namespace("inventory", "toys").unwrap();
    db.create_sub_namespace("inventory", "garden").unwrap();

    db.erase_sub_namespace("inventory", "books").unwrap();
    assert_eq!(
        db.sub_namespace_names("inventory").unwrap(),
        vec!["electronics", "toys", "garden"]
    );
    assert_eq!(kind(&db.erase_sub_namespace("inventory", "books")), ResultKind::SubNsNotFound);
    assert_eq!(db.stats().sub_namespaces, 3);
}

#[test]
fn test_isolation_between_namespaces() {
    let mut db = Database::create();
    db.create_namespace("a").unwrap();
    db.create_namespace("b").unwrap();
    db.insert("a", "k", "v").unwrap();

    assert_eq!(db.get("a", "k").unwrap(), "v");
    assert_eq!(kind(&db.get("b", "k")), ResultKind::KeyNotFound);

    // The same key may live in both.
    db.insert("b", "k", "other").unwrap();
    assert_eq!(db.get("a", "k").unwrap(), "v");
    assert_eq!(db.get("b", "k").unwrap(), "other");
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[test]
fn test_entry_crud_scenario() {
    let mut db = inventory_db();

    db.insert("inventory", "sku-1", "Widget").unwrap();
    assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget");

    db.update("inventory", "sku-1", "Widget-v2").unwrap();
    assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget-v2");
    assert_eq!(kind(&db.update("inventory", "sku-2", "X")), ResultKind::KeyNotFound);

    db.delete("inventory", "sku-1").unwrap();
    assert_eq!(kind(&db.get("inventory", "sku-1")), ResultKind::KeyNotFound);
    assert_eq!(kind(&db.delete("inventory", "sku-1")), ResultKind::KeyNotFound);
}

#[test]
fn test_insert_existing_key_is_key_exists() {
    let mut db = inventory_db();
    db.insert("inventory", "sku-1", "Widget").unwrap();
    assert_eq!(kind(&db.insert("inventory", "sku-1", "Other")), ResultKind::KeyExists);
    assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget");
}

#[test]
fn test_erase_namespace_then_recreate_is_empty() {
    let mut db = inventory_db();
    db.create_sub_namespace("inventory", "electronics").unwrap();
    db.insert("inventory", "sku-1", "Widget").unwrap();
    db.erase_namespace("inventory").unwrap();

    db.create_namespace("inventory").unwrap();
    assert!(db.keys(Scope::Namespace("inventory")).unwrap().is_empty());
    assert!(db.sub_namespace_names("inventory").unwrap().is_empty());
    assert_eq!(kind(&db.get("inventory", "sku-1")), ResultKind::KeyNotFound);
}

// ---------------------------------------------------------------------------
// Query dispatcher
// ---------------------------------------------------------------------------

#[test]
fn test_query_insert_then_direct_get() {
    let mut db = inventory_db();
    assert_eq!(db.execute_query("insert(inventory, sku-3, Gadget)"), Ok(QueryOutput::Done));
    assert_eq!(db.get("inventory", "sku-3").unwrap(), "Gadget");
}

#[test]
fn test_query_get_returns_value() {
    let mut db = inventory_db();
    db.insert("inventory", "sku-3", "Gadget").unwrap();
    let out = db.execute_query("get(inventory, sku-3)").unwrap();
    assert_eq!(out.value(), Some("Gadget"));
}

#[test]
fn test_malformed_queries_leave_store_unchanged() {
    let mut db = inventory_db();
    db.create_sub_namespace("inventory", "electronics").unwrap();
    db.insert("inventory", "sku-1", "Widget").unwrap();
    let before = db.fingerprint();
    let stats = db.stats();

    for text in [
        "bogus(1,2)",
        "insert inventory, k, v",
        "insert(inventory, k, v",
        "insert(inventory, k, v) trailing",
        "insert(inventory, k, v, w)",
        "erase_namespace()",
        "erase_namespace(inventory, extra)",
        "delete(inventory, , sku-1)",
        "(inventory)",
        "",
    ] {
        assert_eq!(kind(&db.execute_query(text)), ResultKind::InvalidQuery, "{text:?}");
    }

    assert_eq!(db.fingerprint(), before);
    assert_eq!(db.stats(), stats);
}

#[test]
fn test_query_errors_pass_through() {
    let mut db = inventory_db();
    assert_eq!(kind(&db.execute_query("create_namespace(inventory)")), ResultKind::NsExists);
    assert_eq!(kind(&db.execute_query("get(missing, k)")), ResultKind::NsNotFound);
    assert_eq!(kind(&db.execute_query("update(inventory, k, v)")), ResultKind::KeyNotFound);
    assert_eq!(
        kind(&db.execute_query("erase_sub_namespace(inventory, nope)")),
        ResultKind::SubNsNotFound
    );
}

// ---------------------------------------------------------------------------
// Memory budget
// ---------------------------------------------------------------------------

#[test]
fn test_budget_exhaustion_is_mem() {
    let config = Config {
        max_memory_bytes: 24,
        max_name_size: 16,
        max_key_size: 8,
        max_value_size: 16,
    };
    let mut db = Database::with_config(config).unwrap();
    db.create_namespace("inventory").unwrap(); // 9 bytes

    db.insert("inventory", "k1", "0123456789").unwrap(); // 12 more, 21 total
    let before = db.fingerprint();
    assert_eq!(kind(&db.insert("inventory", "k2", "xy")), ResultKind::Mem);
    assert_eq!(kind(&db.execute_query("insert(inventory, k2, xy)")), ResultKind::Mem);
    assert_eq!(db.fingerprint(), before);

    // Freeing space makes room again.
    db.delete("inventory", "k1").unwrap();
    db.insert("inventory", "k2", "xy").unwrap();
    assert_eq!(db.stats().bytes_in_use, 9 + 4);
}

#[test]
fn test_erase_releases_everything() {
    let mut db = inventory_db();
    db.create_sub_namespace("inventory", "electronics").unwrap();
    db.insert_at(Scope::SubNamespace { parent: "inventory", sub: "electronics" }, "tv", "OLED")
        .unwrap();
    for i in 0..100 {
        db.insert("inventory", &format!("sku-{i}"), &format!("item {i}")).unwrap();
    }
    assert_eq!(db.stats().entries, 101);

    db.erase_namespace("inventory").unwrap();
    assert_eq!(db.budget().bytes_in_use(), 0);
    assert_eq!(db.budget().allocations(), db.budget().releases());
    db.erase();
}
