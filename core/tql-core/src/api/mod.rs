//! API 모듈 — 트랜잭션 핸들 위의 타입 지정 쿼리 연산
//!
//! Record, IntoValue, FromValue 트레이트 제공

pub mod query;
pub mod traits;
pub mod transaction;

pub use query::QueryOptions;
pub use traits::{FromValue, IntoValue, Record};
pub use transaction::{Transaction, TxState};
