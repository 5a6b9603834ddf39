//! Storage module — the boundary with the transactional tuple store.
//!
//! The query layer depends only on the [`StoreBackend`] trait (Dependency
//! Inversion Principle). Durability, locking, deadlock handling and commit
//! belong to the implementation; [`memory::MemoryStore`] is the in-process
//! reference backend used by tests and embedders.

pub mod lock_table;
pub mod matching;
pub mod memory;
pub mod txn;

pub use memory::MemoryStore;
pub use txn::TxnId;

use crate::codec::Tuple;
use crate::pattern::{MatchPattern, MatchSpec};
use crate::schema::TableSchema;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lock requested per store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Shared
    #[default]
    Read,
    /// Exclusive
    Write,
    /// Exclusive, kept on the local node after commit
    StickyWrite,
}

impl LockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockKind::Read => "read",
            LockKind::Write => "write",
            LockKind::StickyWrite => "sticky_write",
        }
    }

    pub fn is_exclusive(&self) -> bool {
        !matches!(self, LockKind::Read)
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a store. Passed through the query layer unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Lock could not be granted; restarting the transaction may succeed
    #[error("lock conflict on table '{table}' (retryable: {retryable})")]
    LockConflict { table: String, retryable: bool },

    /// The store aborted the transaction
    #[error("transaction aborted by store: {reason}")]
    Aborted { reason: String },

    #[error("no such table '{0}'")]
    NoSuchTable(String),

    #[error("table '{0}' already exists in store")]
    TableExists(String),

    #[error("no such transaction {0}")]
    NoSuchTransaction(TxnId),

    /// Store temporarily unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Tuple shape rejected by the store
    #[error("bad tuple for table '{table}': {reason}")]
    BadTuple { table: String, reason: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::LockConflict { retryable, .. } => *retryable,
            StoreError::Unavailable(_) => true,
            _ => false,
        }
    }

    /// `true` when the store has already ended the transaction.
    pub fn ends_transaction(&self) -> bool {
        matches!(
            self,
            StoreError::Aborted { .. } | StoreError::NoSuchTransaction(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Core store interface.
///
/// # Contract
///
/// - Every data call runs inside the transaction `txn` and may block while the
///   requested lock is acquired.
/// - `read`: all tuples stored under `key` (one at most for set kinds), empty
///   when absent.
/// - `first_key`: first key in the table's native order.
/// - `write`: upsert for `set`/`ordered_set`, append for `bag`.
/// - `delete`: removes every tuple under `key`; absent key is a no-op.
/// - `delete_object`: removes exactly the given tuple.
/// - `match_object`: tuples matching the head, in native order.
/// - `select`: rows shaped by the match spec's result template, in native order,
///   at most `limit` rows.
pub trait StoreBackend: Send + Sync {
    fn begin(&self) -> StoreResult<TxnId>;

    fn commit(&self, txn: TxnId) -> StoreResult<()>;

    fn abort(&self, txn: TxnId) -> StoreResult<()>;

    fn create_table(&self, schema: &TableSchema) -> StoreResult<()>;

    fn drop_table(&self, table: &str) -> StoreResult<()>;

    fn clear_table(&self, table: &str) -> StoreResult<()>;

    fn read(&self, txn: TxnId, table: &str, key: &Value, lock: LockKind) -> StoreResult<Vec<Tuple>>;

    fn first_key(&self, txn: TxnId, table: &str, lock: LockKind) -> StoreResult<Option<Value>>;

    fn write(&self, txn: TxnId, tuple: Tuple, lock: LockKind) -> StoreResult<()>;

    fn delete(&self, txn: TxnId, table: &str, key: &Value, lock: LockKind) -> StoreResult<()>;

    fn delete_object(&self, txn: TxnId, tuple: &Tuple, lock: LockKind) -> StoreResult<()>;

    fn match_object(
        &self,
        txn: TxnId,
        pattern: &MatchPattern,
        lock: LockKind,
    ) -> StoreResult<Vec<Tuple>>;

    fn select(
        &self,
        txn: TxnId,
        spec: &MatchSpec,
        lock: LockKind,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Vec<Value>>>;
}
