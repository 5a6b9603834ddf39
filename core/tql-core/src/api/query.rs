//! Query Facade — 타입 레코드 기반 읽기/쓰기/매치 연산
//!
//! ```text
//! 호출자 → Transaction::{read, write, ...} → (Record Codec | Match Compiler)
//!        → StoreBackend → Record Codec (decode) → 호출자
//! ```
//!
//! 모든 연산은 활성 트랜잭션을 요구합니다. 락을 지정하지 않으면
//! [`DatabaseConfig`](crate::engine::DatabaseConfig)의 기본값을 사용합니다.
//! 결과 순서는 스토어가 정합니다 (`ordered_set`만 키 순서 보장).

use crate::api::transaction::Transaction;
use crate::api::{IntoValue, Record};
use crate::codec::{self, Tuple};
use crate::error::{TqlError, TqlResult};
use crate::pattern::{Condition, Guard, MatchSpec, Pattern, compile_conditions, compile_match};
use crate::schema::TableSchema;
use crate::storage::{LockKind, StoreBackend};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// `all` / `match` / `select` 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// 요청 락 (없으면 설정 기본값)
    pub lock: Option<LockKind>,
    /// 최대 결과 수 (없으면 설정 기본값)
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(mut self, lock: LockKind) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl From<LockKind> for QueryOptions {
    fn from(lock: LockKind) -> Self {
        QueryOptions::new().lock(lock)
    }
}

impl<'db, B: StoreBackend> Transaction<'db, B> {
    // ════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════

    fn schema_of<R: Record>(&self) -> TqlResult<Arc<TableSchema>> {
        self.db.registry().get(R::TABLE_NAME)
    }

    fn read_lock(&self, lock: Option<LockKind>) -> LockKind {
        lock.unwrap_or(self.db.config().default_read_lock)
    }

    /// 쓰기 계열 연산의 락 — `read`는 `InvalidLock`
    fn write_lock(&self, operation: &'static str, lock: Option<LockKind>) -> TqlResult<LockKind> {
        let lock = lock.unwrap_or(self.db.config().default_write_lock);
        if lock.is_exclusive() {
            Ok(lock)
        } else {
            Err(TqlError::InvalidLock {
                operation,
                lock: lock.as_str(),
            })
        }
    }

    fn limit(&self, opts: &QueryOptions) -> Option<usize> {
        opts.limit.or(self.db.config().default_limit)
    }

    fn decode_rows<R: Record>(schema: &TableSchema, rows: Vec<Vec<Value>>) -> TqlResult<Vec<R>> {
        rows.into_iter()
            .map(|row| codec::decode(schema, Tuple::from_parts(schema.name(), row)))
            .collect()
    }

    fn run_select(
        &self,
        txn: crate::storage::TxnId,
        spec: &MatchSpec,
        lock: LockKind,
        limit: Option<usize>,
    ) -> TqlResult<Vec<Vec<Value>>> {
        debug!(head = %spec.head, guards = spec.guards.len(), ?limit, "store select");
        self.track(self.db.store().select(txn, spec, lock, limit))
    }

    // ════════════════════════════════════════════
    // Read Operations
    // ════════════════════════════════════════════

    /// 키로 레코드 조회 — 없으면 `None`
    ///
    /// `bag` 테이블에서는 키의 첫 번째 레코드만 반환합니다.
    /// 전부 필요하면 [`match_records`](Self::match_records)를 사용하세요.
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn read<R: Record>(
        &self,
        key: impl IntoValue,
        lock: impl Into<Option<LockKind>>,
    ) -> TqlResult<Option<R>> {
        let txn = self.context()?;
        let lock = self.read_lock(lock.into());
        let schema = self.schema_of::<R>()?;
        let key = key.into_value();
        let tuples = self.track(self.db.store().read(txn, schema.name(), &key, lock))?;
        tuples
            .into_iter()
            .next()
            .map(|t| codec::decode(&schema, t))
            .transpose()
    }

    /// 테이블의 첫 번째 레코드 (스토어 순서) — 비어 있으면 `None`
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn first<R: Record>(&self, lock: impl Into<Option<LockKind>>) -> TqlResult<Option<R>> {
        let txn = self.context()?;
        let lock = self.read_lock(lock.into());
        let schema = self.schema_of::<R>()?;
        let Some(key) = self.track(self.db.store().first_key(txn, schema.name(), lock))? else {
            return Ok(None);
        };
        let tuples = self.track(self.db.store().read(txn, schema.name(), &key, lock))?;
        tuples
            .into_iter()
            .next()
            .map(|t| codec::decode(&schema, t))
            .transpose()
    }

    /// 테이블의 모든 레코드
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn all<R: Record>(&self, opts: impl Into<QueryOptions>) -> TqlResult<Vec<R>> {
        let opts = opts.into();
        let txn = self.context()?;
        let lock = self.read_lock(opts.lock);
        let schema = self.schema_of::<R>()?;
        let spec = compile_match(&schema, &R::pattern(), &[], None)?;
        let rows = self.run_select(txn, &spec, lock, self.limit(&opts))?;
        Self::decode_rows(&schema, rows)
    }

    /// 부분 패턴 + 가드로 매치
    ///
    /// 가드와 limit이 없으면 `match_object`, 있으면 `select`로 위임합니다.
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn match_records<R: Record>(
        &self,
        pattern: &Pattern,
        guards: &[Guard],
        opts: impl Into<QueryOptions>,
    ) -> TqlResult<Vec<R>> {
        let opts = opts.into();
        let txn = self.context()?;
        let lock = self.read_lock(opts.lock);
        let schema = self.schema_of::<R>()?;
        let spec = compile_match(&schema, pattern, guards, None)?;
        let limit = self.limit(&opts);

        if spec.guards.is_empty() && limit.is_none() {
            debug!(head = %spec.head, "store match_object");
            let tuples = self.track(self.db.store().match_object(txn, &spec.head, lock))?;
            return tuples
                .into_iter()
                .map(|t| codec::decode(&schema, t))
                .collect();
        }
        let rows = self.run_select(txn, &spec, lock, limit)?;
        Self::decode_rows(&schema, rows)
    }

    /// `{attribute, operator, value}` 조건 목록 (AND)으로 조회
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME, conditions = conditions.len()))]
    pub fn select<R: Record>(
        &self,
        conditions: &[Condition],
        opts: impl Into<QueryOptions>,
    ) -> TqlResult<Vec<R>> {
        let opts = opts.into();
        let txn = self.context()?;
        let lock = self.read_lock(opts.lock);
        let schema = self.schema_of::<R>()?;
        let spec = compile_conditions(&schema, conditions, None)?;
        let rows = self.run_select(txn, &spec, lock, self.limit(&opts))?;
        Self::decode_rows(&schema, rows)
    }

    /// 조건으로 조회하고 지정한 속성만 반환
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn select_project<R: Record>(
        &self,
        conditions: &[Condition],
        attributes: &[&str],
        opts: impl Into<QueryOptions>,
    ) -> TqlResult<Vec<Vec<Value>>> {
        let opts = opts.into();
        let txn = self.context()?;
        let lock = self.read_lock(opts.lock);
        let schema = self.schema_of::<R>()?;
        let spec = compile_conditions(&schema, conditions, Some(attributes))?;
        self.run_select(txn, &spec, lock, self.limit(&opts))
    }

    /// 호출자가 만든 match spec을 그대로 실행 — 결과 템플릿 모양의 행 반환
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = spec.table()))]
    pub fn select_raw(
        &self,
        spec: &MatchSpec,
        opts: impl Into<QueryOptions>,
    ) -> TqlResult<Vec<Vec<Value>>> {
        let opts = opts.into();
        let txn = self.context()?;
        let lock = self.read_lock(opts.lock);
        let schema = self.db.registry().get(spec.table())?;
        if spec.head.elements.len() != schema.arity() {
            return Err(TqlError::MalformedTuple {
                table: schema.name().to_string(),
                reason: format!(
                    "match head has {} positions, table arity is {}",
                    spec.head.elements.len(),
                    schema.arity()
                ),
            });
        }
        self.run_select(txn, spec, lock, self.limit(&opts))
    }

    // ════════════════════════════════════════════
    // Write Operations
    // ════════════════════════════════════════════

    /// 레코드 쓰기 — set/ordered_set은 덮어쓰기, bag은 추가
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn write<R: Record>(&self, record: R, lock: impl Into<Option<LockKind>>) -> TqlResult<R> {
        let txn = self.context()?;
        let lock = self.write_lock("write", lock.into())?;
        let schema = self.schema_of::<R>()?;
        let tuple = codec::encode(&schema, &record)?;
        self.track(self.db.store().write(txn, tuple, lock))?;
        Ok(record)
    }

    /// 키의 모든 레코드 삭제 — 없으면 no-op
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn delete<R: Record>(
        &self,
        key: impl IntoValue,
        lock: impl Into<Option<LockKind>>,
    ) -> TqlResult<()> {
        let txn = self.context()?;
        let lock = self.write_lock("delete", lock.into())?;
        let schema = self.schema_of::<R>()?;
        let key = key.into_value();
        self.track(self.db.store().delete(txn, schema.name(), &key, lock))
    }

    /// 정확히 이 레코드만 삭제 (bag 테이블에서 의미 있음)
    #[instrument(level = "debug", skip_all, fields(txn = %self.id(), table = R::TABLE_NAME))]
    pub fn delete_record<R: Record>(
        &self,
        record: &R,
        lock: impl Into<Option<LockKind>>,
    ) -> TqlResult<()> {
        let txn = self.context()?;
        let lock = self.write_lock("delete_record", lock.into())?;
        let schema = self.schema_of::<R>()?;
        let tuple = codec::encode(&schema, record)?;
        self.track(self.db.store().delete_object(txn, &tuple, lock))
    }
}
