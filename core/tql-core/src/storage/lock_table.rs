//! Lock table for [`MemoryStore`](super::MemoryStore).
//!
//! Strict two-phase locking at two granularities, table and record. Locks are
//! held until commit or abort. Requests never wait: a conflicting request is
//! refused and the caller reports a retryable conflict.
//!
//! | held by other \ requested | rec S | rec X | table S | table X |
//! |---------------------------|-------|-------|---------|---------|
//! | rec S (same key)          | ok    | no    | ok      | no      |
//! | rec X (same key)          | no    | no    | no      | no      |
//! | table S                   | ok    | no    | ok      | no      |
//! | table X                   | no    | no    | no      | no      |

use crate::storage::TxnId;
use crate::value::Value;
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Default)]
struct Holders {
    shared: AHashSet<TxnId>,
    exclusive: Option<TxnId>,
}

impl Holders {
    fn held_by_other(&self, txn: TxnId) -> bool {
        self.exclusive.is_some_and(|x| x != txn) || self.shared.iter().any(|s| *s != txn)
    }

    fn exclusive_by_other(&self, txn: TxnId) -> bool {
        self.exclusive.is_some_and(|x| x != txn)
    }

    fn grant(&mut self, txn: TxnId, exclusive: bool) {
        if exclusive {
            self.shared.remove(&txn);
            self.exclusive = Some(txn);
        } else if self.exclusive != Some(txn) {
            self.shared.insert(txn);
        }
    }

    fn release(&mut self, txn: TxnId) {
        self.shared.remove(&txn);
        if self.exclusive == Some(txn) {
            self.exclusive = None;
        }
    }

    fn is_free(&self) -> bool {
        self.exclusive.is_none() && self.shared.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Target {
    Table(String),
    Record(String, Value),
}

/// Granted locks, indexed by table and by owner.
#[derive(Debug, Default)]
pub struct LockTable {
    tables: AHashMap<String, Holders>,
    records: AHashMap<String, AHashMap<Value, Holders>>,
    owned: AHashMap<TxnId, AHashSet<Target>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to lock one record. Returns `false` on conflict.
    pub fn lock_record(&mut self, txn: TxnId, table: &str, key: &Value, exclusive: bool) -> bool {
        if let Some(holders) = self.tables.get(table) {
            let blocked = if exclusive {
                holders.held_by_other(txn)
            } else {
                holders.exclusive_by_other(txn)
            };
            if blocked {
                return false;
            }
        }
        let entry = self
            .records
            .entry(table.to_string())
            .or_default()
            .entry(key.clone())
            .or_default();
        let blocked = if exclusive {
            entry.held_by_other(txn)
        } else {
            entry.exclusive_by_other(txn)
        };
        if blocked {
            return false;
        }
        entry.grant(txn, exclusive);
        self.owned
            .entry(txn)
            .or_default()
            .insert(Target::Record(table.to_string(), key.clone()));
        true
    }

    /// Try to lock a whole table. Returns `false` on conflict.
    pub fn lock_table(&mut self, txn: TxnId, table: &str, exclusive: bool) -> bool {
        if let Some(records) = self.records.get(table) {
            let blocked = records.values().any(|holders| {
                if exclusive {
                    holders.held_by_other(txn)
                } else {
                    holders.exclusive_by_other(txn)
                }
            });
            if blocked {
                return false;
            }
        }
        let entry = self.tables.entry(table.to_string()).or_default();
        let blocked = if exclusive {
            entry.held_by_other(txn)
        } else {
            entry.exclusive_by_other(txn)
        };
        if blocked {
            return false;
        }
        entry.grant(txn, exclusive);
        self.owned
            .entry(txn)
            .or_default()
            .insert(Target::Table(table.to_string()));
        true
    }

    /// Release every lock held by `txn`.
    pub fn release_all(&mut self, txn: TxnId) {
        let Some(targets) = self.owned.remove(&txn) else {
            return;
        };
        for target in targets {
            match target {
                Target::Table(table) => {
                    if let Some(holders) = self.tables.get_mut(&table) {
                        holders.release(txn);
                        if holders.is_free() {
                            self.tables.remove(&table);
                        }
                    }
                }
                Target::Record(table, key) => {
                    if let Some(records) = self.records.get_mut(&table) {
                        if let Some(holders) = records.get_mut(&key) {
                            holders.release(txn);
                            if holders.is_free() {
                                records.remove(&key);
                            }
                        }
                        if records.is_empty() {
                            self.records.remove(&table);
                        }
                    }
                }
            }
        }
    }

    /// Number of lock targets held by `txn`.
    pub fn held_by(&self, txn: TxnId) -> usize {
        self.owned.get(&txn).map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: TxnId = TxnId(1);
    const T2: TxnId = TxnId(2);

    fn key(k: i64) -> Value {
        Value::Int64(k)
    }

    #[test]
    fn shared_record_locks_coexist() {
        let mut locks = LockTable::new();
        assert!(locks.lock_record(T1, "t", &key(1), false));
        assert!(locks.lock_record(T2, "t", &key(1), false));
        assert!(!locks.lock_record(T2, "t", &key(1), true));
    }

    #[test]
    fn exclusive_record_blocks_readers() {
        let mut locks = LockTable::new();
        assert!(locks.lock_record(T1, "t", &key(1), true));
        assert!(!locks.lock_record(T2, "t", &key(1), false));
        assert!(locks.lock_record(T2, "t", &key(2), true));
    }

    #[test]
    fn upgrade_when_sole_reader() {
        let mut locks = LockTable::new();
        assert!(locks.lock_record(T1, "t", &key(1), false));
        assert!(locks.lock_record(T1, "t", &key(1), true));
        assert_eq!(locks.held_by(T1), 1);
    }

    #[test]
    fn table_lock_against_record_locks() {
        let mut locks = LockTable::new();
        assert!(locks.lock_record(T1, "t", &key(1), true));
        assert!(!locks.lock_table(T2, "t", false));
        assert!(locks.lock_table(T2, "other", true));

        let mut locks = LockTable::new();
        assert!(locks.lock_table(T1, "t", false));
        assert!(locks.lock_record(T2, "t", &key(1), false));
        assert!(!locks.lock_record(T2, "t", &key(1), true));
    }

    #[test]
    fn release_frees_everything() {
        let mut locks = LockTable::new();
        assert!(locks.lock_table(T1, "t", true));
        assert!(locks.lock_record(T1, "u", &key(3), true));
        assert!(!locks.lock_table(T2, "t", false));
        locks.release_all(T1);
        assert_eq!(locks.held_by(T1), 0);
        assert!(locks.lock_table(T2, "t", true));
        assert!(locks.lock_record(T2, "u", &key(3), true));
    }
}
