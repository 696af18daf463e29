//! Error types for NestKV operations
//!
//! Every public operation returns a [`StoreResult`]. Each non-OK outcome is a
//! [`StoreError`] variant carrying the names involved; [`ResultKind`] is the
//! flat tag callers match on when they only care about the outcome class.

use thiserror::Error;

/// NestKV error types with the offending names attached
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The memory budget refused to duplicate a string
    #[error("allocation refused: requested {requested} bytes, {available} available ({reason})")]
    Mem {
        /// Bytes the call tried to allocate
        requested: u64,
        /// Bytes still available under the limit that refused the request
        available: u64,
        /// Which limit refused the request
        reason: &'static str,
    },

    /// No top-level namespace with this name
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// A top-level namespace with this name already exists
    #[error("namespace already exists: {0}")]
    NamespaceExists(String),

    /// The parent exists but has no sub-namespace with this name
    #[error("sub-namespace not found: {parent}/{sub}")]
    SubNamespaceNotFound {
        /// Parent namespace name
        parent: String,
        /// Missing sub-namespace name
        sub: String,
    },

    /// The parent already has a sub-namespace with this name
    #[error("sub-namespace already exists: {parent}/{sub}")]
    SubNamespaceExists {
        /// Parent namespace name
        parent: String,
        /// Duplicate sub-namespace name
        sub: String,
    },

    /// The namespace exists but holds no entry with this key
    #[error("key not found in {namespace}: {key}")]
    KeyNotFound {
        /// Namespace (or `parent/sub`) that was searched
        namespace: String,
        /// Missing key
        key: String,
    },

    /// Insert found the key already present
    #[error("key already exists in {namespace}: {key}")]
    KeyExists {
        /// Namespace (or `parent/sub`) holding the key
        namespace: String,
        /// Duplicate key
        key: String,
    },

    /// Query text failed to parse or named an unknown command
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration rejected by `Config::validate`
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for NestKV operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Flat outcome tag for a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Ok,
    Mem,
    NsNotFound,
    NsExists,
    SubNsNotFound,
    SubNsExists,
    KeyNotFound,
    KeyExists,
    InvalidQuery,
    InvalidConfig,
}

impl ResultKind {
    /// Classify any store result.
    pub fn of<T>(result: &StoreResult<T>) -> Self {
        match result {
            Ok(_) => ResultKind::Ok,
            Err(err) => err.kind(),
        }
    }

    /// Upper-case tag as printed by the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Ok => "OK",
            ResultKind::Mem => "MEM",
            ResultKind::NsNotFound => "NS_NOT_FOUND",
            ResultKind::NsExists => "NS_EXISTS",
            ResultKind::SubNsNotFound => "SUB_NS_NOT_FOUND",
            ResultKind::SubNsExists => "SUB_NS_EXISTS",
            ResultKind::KeyNotFound => "KEY_NOT_FOUND",
            ResultKind::KeyExists => "KEY_EXISTS",
            ResultKind::InvalidQuery => "INVALID_QUERY",
            ResultKind::InvalidConfig => "INVALID_CONFIG",
        }
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    /// Outcome tag for this error.
    pub fn kind(&self) -> ResultKind {
        match self {
            StoreError::Mem { .. } => ResultKind::Mem,
            StoreError::NamespaceNotFound(_) => ResultKind::NsNotFound,
            StoreError::NamespaceExists(_) => ResultKind::NsExists,
            StoreError::SubNamespaceNotFound { .. } => ResultKind::SubNsNotFound,
            StoreError::SubNamespaceExists { .. } => ResultKind::SubNsExists,
            StoreError::KeyNotFound { .. } => ResultKind::KeyNotFound,
            StoreError::KeyExists { .. } => ResultKind::KeyExists,
            StoreError::InvalidQuery(_) => ResultKind::InvalidQuery,
            StoreError::InvalidConfig(_) => ResultKind::InvalidConfig,
        }
    }

    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        StoreError::InvalidQuery(reason.into())
    }
}
