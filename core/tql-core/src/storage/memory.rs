//! In-memory transactional tuple store.
//!
//! Reference [`StoreBackend`] used by tests and single-process embedders.
//! Writes are applied in place under exclusive locks; each transaction keeps an
//! undo log replayed in reverse on abort. Locks follow strict two-phase locking
//! (see [`LockTable`]) and never wait.

use crate::codec::Tuple;
use crate::pattern::{MatchPattern, MatchSpec};
use crate::schema::{TableKind, TableSchema};
use crate::storage::lock_table::LockTable;
use crate::storage::matching::{apply_spec, matches_head};
use crate::storage::txn::TxnIdOracle;
use crate::storage::{LockKind, StoreBackend, StoreError, StoreResult, TxnId};
use crate::value::Value;
use ahash::AHashMap;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Rows of one table, grouped by key in key order.
#[derive(Debug)]
struct TableData {
    kind: TableKind,
    arity: usize,
    rows: BTreeMap<Value, Vec<Vec<Value>>>,
}

impl TableData {
    fn iter_rows(&self) -> impl Iterator<Item = &Vec<Value>> {
        self.rows.values().flatten()
    }
}

/// Previous state of one key, restored on abort.
#[derive(Debug)]
struct UndoEntry {
    table: String,
    key: Value,
    previous: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Default)]
struct TxnState {
    undo: Vec<UndoEntry>,
}

/// In-memory store backend
pub struct MemoryStore {
    tables: RwLock<AHashMap<String, TableData>>,
    locks: Mutex<LockTable>,
    active: DashMap<TxnId, TxnState>,
    oracle: TxnIdOracle,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(AHashMap::new()),
            locks: Mutex::new(LockTable::new()),
            active: DashMap::new(),
            oracle: TxnIdOracle::default(),
        }
    }

    /// Number of transactions begun and not yet ended.
    pub fn active_transactions(&self) -> usize {
        self.active.len()
    }

    /// Committed-or-in-flight row count, outside any transaction.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        Ok(data.iter_rows().count())
    }

    fn ensure_active(&self, txn: TxnId) -> StoreResult<()> {
        if self.active.contains_key(&txn) {
            Ok(())
        } else {
            Err(StoreError::NoSuchTransaction(txn))
        }
    }

    fn lock_record(&self, txn: TxnId, table: &str, key: &Value, lock: LockKind) -> StoreResult<()> {
        if self
            .locks
            .lock()
            .lock_record(txn, table, key, lock.is_exclusive())
        {
            Ok(())
        } else {
            trace!(%txn, table, %key, %lock, "record lock refused");
            Err(StoreError::LockConflict {
                table: table.to_string(),
                retryable: true,
            })
        }
    }

    fn lock_table(&self, txn: TxnId, table: &str, lock: LockKind) -> StoreResult<()> {
        if self.locks.lock().lock_table(txn, table, lock.is_exclusive()) {
            Ok(())
        } else {
            trace!(%txn, table, %lock, "table lock refused");
            Err(StoreError::LockConflict {
                table: table.to_string(),
                retryable: true,
            })
        }
    }

    /// Lock what a pattern can touch: one record when the key is bound,
    /// otherwise the whole table.
    fn lock_for_pattern(&self, txn: TxnId, head: &MatchPattern, lock: LockKind) -> StoreResult<()> {
        match head.bound_key() {
            Some(key) => self.lock_record(txn, &head.table, key, lock),
            None => self.lock_table(txn, &head.table, lock),
        }
    }

    /// Mutate the rows under one key, recording the previous state.
    fn mutate<F>(&self, txn: TxnId, table: &str, key: &Value, f: F) -> StoreResult<()>
    where
        F: FnOnce(TableKind, &mut Vec<Vec<Value>>),
    {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        let previous = data.rows.get(key).cloned();
        let mut rows = previous.clone().unwrap_or_default();
        f(data.kind, &mut rows);
        if rows.is_empty() {
            data.rows.remove(key);
        } else {
            data.rows.insert(key.clone(), rows);
        }
        drop(tables);

        let mut state = self
            .active
            .get_mut(&txn)
            .ok_or(StoreError::NoSuchTransaction(txn))?;
        state.undo.push(UndoEntry {
            table: table.to_string(),
            key: key.clone(),
            previous,
        });
        Ok(())
    }

    fn finish(&self, txn: TxnId) {
        self.locks.lock().release_all(txn);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryStore {
    fn begin(&self) -> StoreResult<TxnId> {
        let txn = self.oracle.next();
        self.active.insert(txn, TxnState::default());
        debug!(%txn, "begin");
        Ok(txn)
    }

    fn commit(&self, txn: TxnId) -> StoreResult<()> {
        self.active
            .remove(&txn)
            .ok_or(StoreError::NoSuchTransaction(txn))?;
        self.finish(txn);
        debug!(%txn, "commit");
        Ok(())
    }

    fn abort(&self, txn: TxnId) -> StoreResult<()> {
        let (_, state) = self
            .active
            .remove(&txn)
            .ok_or(StoreError::NoSuchTransaction(txn))?;
        {
            let mut tables = self.tables.write();
            for entry in state.undo.into_iter().rev() {
                // A table dropped mid-transaction has nothing left to restore.
                let Some(data) = tables.get_mut(&entry.table) else {
                    continue;
                };
                match entry.previous {
                    Some(rows) => {
                        data.rows.insert(entry.key, rows);
                    }
                    None => {
                        data.rows.remove(&entry.key);
                    }
                }
            }
        }
        self.finish(txn);
        debug!(%txn, "abort");
        Ok(())
    }

    fn create_table(&self, schema: &TableSchema) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(schema.name()) {
            return Err(StoreError::TableExists(schema.name().to_string()));
        }
        tables.insert(
            schema.name().to_string(),
            TableData {
                kind: schema.kind(),
                arity: schema.arity(),
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn drop_table(&self, table: &str) -> StoreResult<()> {
        self.tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))
    }

    fn clear_table(&self, table: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        data.rows.clear();
        Ok(())
    }

    fn read(&self, txn: TxnId, table: &str, key: &Value, lock: LockKind) -> StoreResult<Vec<Tuple>> {
        self.ensure_active(txn)?;
        self.lock_record(txn, table, key, lock)?;
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        Ok(data
            .rows
            .get(key)
            .map(|rows| {
                rows.iter()
                    .map(|r| Tuple::from_parts(table, r.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn first_key(&self, txn: TxnId, table: &str, lock: LockKind) -> StoreResult<Option<Value>> {
        self.ensure_active(txn)?;
        self.lock_table(txn, table, lock)?;
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::NoSuchTable(table.to_string()))?;
        Ok(data.rows.keys().next().cloned())
    }

    fn write(&self, txn: TxnId, tuple: Tuple, lock: LockKind) -> StoreResult<()> {
        self.ensure_active(txn)?;
        let table = tuple.table().to_string();
        {
            let tables = self.tables.read();
            let data = tables
                .get(&table)
                .ok_or_else(|| StoreError::NoSuchTable(table.clone()))?;
            if tuple.values().len() != data.arity {
                return Err(StoreError::BadTuple {
                    table,
                    reason: format!(
                        "expected {} attributes, got {}",
                        data.arity,
                        tuple.values().len()
                    ),
                });
            }
        }
        let key = tuple.key().cloned().unwrap_or(Value::Null);
        self.lock_record(txn, &table, &key, lock)?;
        let row = tuple.into_values();
        self.mutate(txn, &table, &key, |kind, rows| match kind {
            TableKind::Set | TableKind::OrderedSet => {
                rows.clear();
                rows.push(row);
            }
            TableKind::Bag => {
                if !rows.contains(&row) {
                    rows.push(row);
                }
            }
        })
    }

    fn delete(&self, txn: TxnId, table: &str, key: &Value, lock: LockKind) -> StoreResult<()> {
        self.ensure_active(txn)?;
        self.lock_record(txn, table, key, lock)?;
        self.mutate(txn, table, key, |_, rows| rows.clear())
    }

    fn delete_object(&self, txn: TxnId, tuple: &Tuple, lock: LockKind) -> StoreResult<()> {
        self.ensure_active(txn)?;
        let key = tuple.key().cloned().unwrap_or(Value::Null);
        self.lock_record(txn, tuple.table(), &key, lock)?;
        let target = tuple.values();
        self.mutate(txn, tuple.table(), &key, |_, rows| {
            rows.retain(|r| r.as_slice() != target)
        })
    }

    fn match_object(
        &self,
        txn: TxnId,
        pattern: &MatchPattern,
        lock: LockKind,
    ) -> StoreResult<Vec<Tuple>> {
        self.ensure_active(txn)?;
        self.lock_for_pattern(txn, pattern, lock)?;
        let tables = self.tables.read();
        let data = tables
            .get(&pattern.table)
            .ok_or_else(|| StoreError::NoSuchTable(pattern.table.clone()))?;
        let candidates: Box<dyn Iterator<Item = &Vec<Value>> + '_> = match pattern.bound_key() {
            Some(key) => Box::new(data.rows.get(key).into_iter().flatten()),
            None => Box::new(data.iter_rows()),
        };
        Ok(candidates
            .filter(|row| matches_head(pattern, row))
            .map(|row| Tuple::from_parts(pattern.table.as_str(), row.clone()))
            .collect())
    }

    fn select(
        &self,
        txn: TxnId,
        spec: &MatchSpec,
        lock: LockKind,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Vec<Value>>> {
        self.ensure_active(txn)?;
        self.lock_for_pattern(txn, &spec.head, lock)?;
        let tables = self.tables.read();
        let data = tables
            .get(spec.table())
            .ok_or_else(|| StoreError::NoSuchTable(spec.table().to_string()))?;
        let candidates: Box<dyn Iterator<Item = &Vec<Value>> + '_> = match spec.head.bound_key() {
            Some(key) => Box::new(data.rows.get(key).into_iter().flatten()),
            None => Box::new(data.iter_rows()),
        };
        let rows = candidates.filter_map(|row| apply_spec(spec, row));
        Ok(match limit {
            Some(n) => rows.take(n).collect(),
            None => rows.collect(),
        })
    }
}
