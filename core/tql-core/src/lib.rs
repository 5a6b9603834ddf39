//! # TQL — Typed Query Layer over a Transactional Tuple Store
//!
//! TQL은 트랜잭션 튜플 스토어 위에서 타입이 지정된 레코드로 읽기, 쓰기,
//! 패턴 매치, 조건 조회를 수행하는 쿼리 계층입니다.
//! 락 획득, 교착 상태 처리, 영속성은 스토어([`StoreBackend`])의 책임입니다.
//!
//! ## 주요 특징
//!
//! - **Record Codec**: `#[derive(Record)]` 구조체 ↔ `{table, v1, v2, ...}` 튜플
//! - **Match Compiler**: 부분 패턴 + 가드 → 스토어 match spec
//! - **Query Facade**: read / first / write / all / delete / match / select
//! - **명시적 트랜잭션**: 모든 연산은 Active 트랜잭션 핸들을 요구
//!
//! ## 빠른 시작
//!
//! ```rust
//! use tql_core::{CompareOp, Condition, Database, MemoryStore, QueryOptions, Record, TableKind};
//!
//! #[derive(Debug, Clone, PartialEq, Record)]
//! #[tql(table_name = "person")]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! # fn main() -> tql_core::TqlResult<()> {
//! let db = Database::new(MemoryStore::new());
//! db.create_table::<Person>(TableKind::Set)?;
//!
//! db.transaction(|tx| {
//!     tx.write(Person { id: 1, name: "A".into(), age: 30 }, None)?;
//!     tx.write(Person { id: 2, name: "B".into(), age: 40 }, None)?;
//!     Ok(())
//! })?;
//!
//! let older = db.transaction(|tx| {
//!     tx.select::<Person>(&[Condition::new("age", CompareOp::Gt, 35)], QueryOptions::new())
//! })?;
//! assert_eq!(older.len(), 1);
//! assert_eq!(older[0].name, "B");
//! # Ok(())
//! # }
//! ```
//!
//! ## 실행 흐름
//!
//! ```text
//! Record → Codec (encode) → StoreBackend::write
//! Pattern + Guards → Match Compiler → MatchSpec → StoreBackend::select
//!        → rows → Codec (decode) → Record
//! ```
//!
//! ## 모듈 구조
//!
//! - [`api`] — 트랜잭션 핸들과 쿼리 연산
//! - [`codec`] — 레코드 ↔ 튜플 변환
//! - [`engine`] — [`Database`]와 설정
//! - [`pattern`] — 패턴, 가드, match spec 컴파일러
//! - [`schema`] — 테이블 스키마 레지스트리
//! - [`storage`] — 스토어 계약과 인메모리 구현

extern crate self as tql_core;

pub mod api;
pub mod codec;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod schema;
pub mod storage;
pub mod value;

// ════════════════════════════════════════════
// Re-exports
// ════════════════════════════════════════════

pub use api::{QueryOptions, Record, Transaction, TxState};
pub use codec::Tuple;
pub use engine::{Database, DatabaseConfig};
pub use error::{TqlError, TqlResult};
pub use pattern::{CompareOp, Condition, Guard, MatchSpec, Pattern};
pub use schema::{SchemaRegistry, TableKind, TableSchema};
pub use storage::{LockKind, MemoryStore, StoreBackend, StoreError};
pub use value::Value;

pub use tql_derive::Record;
