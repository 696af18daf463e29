//! NestKV Core: Namespace-Organized In-Memory Key-Value Store
//!
//! A small store where string entries live inside named namespaces, and each
//! namespace may hold one level of named sub-namespaces with entries of
//! their own. Everything is in RAM for the life of the [`Database`] handle.
//!
//! # Architecture
//!
//! - **Database**: owns the namespaces; root of the object graph
//! - **Namespace**: owns its sub-namespaces and an entry store
//! - **Entry store**: owned key/value strings, unique keys
//! - **Query dispatcher**: `command(arg, ...)` text mapped onto the same API
//! - **Memory budget**: every owned string is duplicated through it, so
//!   allocation failure (`MEM`) is a normal, testable outcome
//!
//! # Example
//!
//! ```
//! use nestkv_core::{Database, QueryOutput};
//!
//! let mut db = Database::create();
//! db.create_namespace("inventory").unwrap();
//! db.insert("inventory", "sku-1", "Widget").unwrap();
//! assert_eq!(db.get("inventory", "sku-1").unwrap(), "Widget");
//!
//! let out = db.execute_query("get(inventory, sku-1)").unwrap();
//! assert_eq!(out, QueryOutput::Value("Widget".into()));
//! ```

pub mod budget;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod format;
pub mod namespace;
pub mod query;

// Re-export key types for convenience
pub use budget::{MemoryBudget, StringKind};
pub use config::Config;
pub use database::{Database, DatabaseStats, Scope};
pub use dispatch::{CommandSpec, QueryOutput, COMMANDS};
pub use error::{ResultKind, StoreError, StoreResult};
pub use query::{parse, ParsedQuery};
