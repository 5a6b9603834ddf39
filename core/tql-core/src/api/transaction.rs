//! Transaction — 명시적 트랜잭션 컨텍스트
//!
//! 모든 쿼리 연산은 [`Transaction`] 핸들을 통해 호출됩니다.
//! 핸들이 Active 상태가 아니면 (커밋/중단 후, 또는 스토어가 중단시킨 경우)
//! 모든 연산은 `NoTransactionContext`로 실패합니다.
//! 락 획득, 교착 상태 감지, 재시도는 스토어의 책임입니다.

use crate::engine::Database;
use crate::error::{TqlError, TqlResult};
use crate::storage::{StoreBackend, StoreResult, TxnId};
use std::cell::Cell;
use tracing::{debug, warn};

/// 트랜잭션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// 트랜잭션 진행 중
    Active,
    /// 커밋 완료
    Committed,
    /// 중단됨 (호출자 또는 스토어에 의해)
    Aborted,
}

/// 트랜잭션 핸들
///
/// 스레드 간 공유되지 않습니다. 동시 트랜잭션은 각자 `begin()`을 호출합니다.
pub struct Transaction<'db, B: StoreBackend> {
    pub(crate) db: &'db Database<B>,
    id: TxnId,
    state: Cell<TxState>,
}

impl<B: StoreBackend> Database<B> {
    /// 트랜잭션 시작
    ///
    /// 스토어에 새 트랜잭션을 열고 Active 핸들을 반환합니다.
    pub fn begin(&self) -> TqlResult<Transaction<'_, B>> {
        let id = self.store().begin()?;
        debug!(txn = %id, "transaction started");
        Ok(Transaction {
            db: self,
            id,
            state: Cell::new(TxState::Active),
        })
    }

    /// 클로저를 새 트랜잭션 안에서 실행
    ///
    /// `Ok`이면 커밋, `Err`이면 중단 후 에러를 그대로 반환합니다.
    /// 재시도하지 않습니다 — 재시도 정책은 호출자의 몫입니다.
    pub fn transaction<T, F>(&self, f: F) -> TqlResult<T>
    where
        F: FnOnce(&Transaction<'_, B>) -> TqlResult<T>,
    {
        let mut tx = self.begin()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if tx.is_active()
                    && let Err(abort_err) = tx.abort()
                {
                    warn!(txn = %tx.id(), error = %abort_err, "abort after failed closure");
                }
                Err(err)
            }
        }
    }
}

impl<'db, B: StoreBackend> Transaction<'db, B> {
    pub fn id(&self) -> TxnId {
        self.id
    }

    pub fn state(&self) -> TxState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == TxState::Active
    }

    /// 활성 트랜잭션 id, 아니면 `NoTransactionContext`
    pub(crate) fn context(&self) -> TqlResult<TxnId> {
        if self.is_active() {
            Ok(self.id)
        } else {
            Err(TqlError::NoTransactionContext)
        }
    }

    /// 스토어 결과를 그대로 전달하되, 스토어가 트랜잭션을 끝냈으면 핸들을 Aborted로 표시
    pub(crate) fn track<T>(&self, result: StoreResult<T>) -> TqlResult<T> {
        result.map_err(|err| {
            if err.ends_transaction() {
                warn!(txn = %self.id, error = %err, "store ended transaction");
                self.state.set(TxState::Aborted);
            }
            TqlError::from(err)
        })
    }

    // ════════════════════════════════════════════
    // Commit / Abort
    // ════════════════════════════════════════════

    /// 트랜잭션 커밋
    pub fn commit(&mut self) -> TqlResult<()> {
        let id = self.context()?;
        let result = self.db.store().commit(id);
        match result {
            Ok(()) => {
                self.state.set(TxState::Committed);
                debug!(txn = %id, "transaction committed");
                Ok(())
            }
            Err(err) => {
                // 커밋 실패 후 핸들은 더 이상 사용할 수 없음
                self.state.set(TxState::Aborted);
                Err(err.into())
            }
        }
    }

    /// 트랜잭션 중단 — 스토어가 모든 쓰기를 되돌림
    pub fn abort(&mut self) -> TqlResult<()> {
        let id = self.context()?;
        self.state.set(TxState::Aborted);
        self.db.store().abort(id)?;
        debug!(txn = %id, "transaction aborted");
        Ok(())
    }
}

impl<B: StoreBackend> Drop for Transaction<'_, B> {
    fn drop(&mut self) {
        if self.is_active() {
            self.state.set(TxState::Aborted);
            if let Err(err) = self.db.store().abort(self.id) {
                warn!(txn = %self.id, error = %err, "abort on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_begin_commit() {
        let db = Database::new(MemoryStore::new());
        let mut tx = db.begin().unwrap();
        assert!(tx.is_active());
        assert_eq!(db.store().active_transactions(), 1);

        tx.commit().unwrap();
        assert_eq!(tx.state(), TxState::Committed);
        assert_eq!(db.store().active_transactions(), 0);
    }

    #[test]
    fn test_double_commit_has_no_context() {
        let db = Database::new(MemoryStore::new());
        let mut tx = db.begin().unwrap();
        tx.commit().unwrap();
        assert!(matches!(tx.commit(), Err(TqlError::NoTransactionContext)));
        assert!(matches!(tx.abort(), Err(TqlError::NoTransactionContext)));
    }

    #[test]
    fn test_drop_aborts() {
        let db = Database::new(MemoryStore::new());
        {
            let _tx = db.begin().unwrap();
            assert_eq!(db.store().active_transactions(), 1);
        }
        assert_eq!(db.store().active_transactions(), 0);
    }

    #[test]
    fn test_transaction_closure_commits_on_ok() {
        let db = Database::new(MemoryStore::new());
        let id = db.transaction(|tx| Ok(tx.id())).unwrap();
        assert_eq!(id, TxnId(1));
        assert_eq!(db.store().active_transactions(), 0);
    }

    #[test]
    fn test_transaction_closure_aborts_on_err() {
        let db = Database::new(MemoryStore::new());
        let err = db
            .transaction(|_tx| -> TqlResult<()> { Err(TqlError::Schema("boom".into())) })
            .unwrap_err();
        assert!(matches!(err, TqlError::Schema(_)));
        assert_eq!(db.store().active_transactions(), 0);
    }

    #[test]
    fn test_store_abort_marks_handle() {
        let db = Database::new(MemoryStore::new());
        let tx = db.begin().unwrap();
        // 스토어가 트랜잭션을 먼저 끝낸 상황
        db.store().abort(tx.id()).unwrap();
        let err = tx
            .track(db.store().commit(tx.id()))
            .unwrap_err();
        assert!(matches!(err, TqlError::Store { .. }));
        assert_eq!(tx.state(), TxState::Aborted);
        assert!(matches!(tx.context(), Err(TqlError::NoTransactionContext)));
    }
}
