//! Command table and query execution.
//!
//! Each command has an exact argument count. The count is checked before the
//! handler runs, so a rejected query never reaches the database.

use std::fmt;

use tracing::debug;

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::query;

/// What a successful query produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    /// A mutation succeeded
    Done,
    /// `get` found a value; the caller owns the copy
    Value(String),
}

impl QueryOutput {
    pub fn value(&self) -> Option<&str> {
        match self {
            QueryOutput::Done => None,
            QueryOutput::Value(v) => Some(v),
        }
    }
}

/// Handler callback. `args.len()` always equals the command arity.
pub type CommandHandler = fn(&mut Database, &[String]) -> StoreResult<QueryOutput>;

/// Metadata and callback for one command table entry.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Exact, case-sensitive command name
    pub name: &'static str,
    /// Required number of arguments
    pub arity: usize,
    pub handler: CommandHandler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Every command the dispatcher recognizes.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "create_namespace", arity: 1, handler: handle_create_namespace },
    CommandSpec { name: "create_sub_namespace", arity: 2, handler: handle_create_sub_namespace },
    CommandSpec { name: "erase_namespace", arity: 1, handler: handle_erase_namespace },
    CommandSpec { name: "erase_sub_namespace", arity: 2, handler: handle_erase_sub_namespace },
    CommandSpec { name: "insert", arity: 3, handler: handle_insert },
    CommandSpec { name: "get", arity: 2, handler: handle_get },
    CommandSpec { name: "update", arity: 3, handler: handle_update },
    CommandSpec { name: "delete", arity: 2, handler: handle_delete },
];

/// Find a command by exact name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Parse `text`, validate it against the command table, then run it.
pub fn execute(db: &mut Database, text: &str) -> StoreResult<QueryOutput> {
    let parsed = query::parse(text)?;
    let spec = lookup(&parsed.command)
        .ok_or_else(|| StoreError::InvalidQuery(format!("unknown command: {}", parsed.command)))?;
    if parsed.args.len() != spec.arity {
        return Err(StoreError::InvalidQuery(format!(
            "{} takes {} argument(s), got {}",
            spec.name,
            spec.arity,
            parsed.args.len()
        )));
    }
    debug!(command = spec.name, args = parsed.args.len(), "dispatching query");
    (spec.handler)(db, &parsed.args)
}

fn handle_create_namespace(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.create_namespace(&args[0]).map(|_| QueryOutput::Done)
}

fn handle_create_sub_namespace(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.create_sub_namespace(&args[0], &args[1]).map(|_| QueryOutput::Done)
}

fn handle_erase_namespace(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.erase_namespace(&args[0]).map(|_| QueryOutput::Done)
}

fn handle_erase_sub_namespace(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.erase_sub_namespace(&args[0], &args[1]).map(|_| QueryOutput::Done)
}

fn handle_insert(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.insert(&args[0], &args[1], &args[2]).map(|_| QueryOutput::Done)
}

fn handle_get(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.get(&args[0], &args[1]).map(QueryOutput::Value)
}

fn handle_update(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.update(&args[0], &args[1], &args[2]).map(|_| QueryOutput::Done)
}

fn handle_delete(db: &mut Database, args: &[String]) -> StoreResult<QueryOutput> {
    db.delete(&args[0], &args[1]).map(|_| QueryOutput::Done)
}
