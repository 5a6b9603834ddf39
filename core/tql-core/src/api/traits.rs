//! API 트레이트 정의
//!
//! 타입이 지정된 레코드와 스토어 튜플 사이의 변환 계약.

use crate::error::{TqlError, TqlResult};
use crate::pattern::Pattern;
use crate::schema::{TableKind, TableSchema};
use crate::value::Value;

/// 구조체 ↔ 위치 기반 값 목록 변환 트레이트
///
/// `#[derive(Record)]`가 구현을 생성합니다. 첫 번째 필드가 기본 키입니다.
pub trait Record: Sized {
    /// 테이블 이름 (튜플 태그)
    const TABLE_NAME: &'static str;

    /// 스키마 순서의 속성 이름
    const ATTRIBUTES: &'static [&'static str];

    /// 필드 값을 스키마 순서로 반환
    fn to_values(&self) -> Vec<Value>;

    /// 스키마 순서의 값 목록에서 레코드 생성
    fn from_values(values: Vec<Value>) -> TqlResult<Self>;

    /// 이 레코드 타입에 대한 테이블 스키마
    fn schema(kind: TableKind) -> TqlResult<TableSchema> {
        TableSchema::new(Self::TABLE_NAME, Self::ATTRIBUTES.iter().copied(), kind)
    }

    /// 모든 속성이 placeholder인 매치 패턴
    fn pattern() -> Pattern {
        Pattern::new(Self::TABLE_NAME)
    }
}

/// Rust 타입을 [`Value`]로 변환하는 트레이트
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// [`Value`]에서 Rust 타입으로 변환하는 트레이트
pub trait FromValue: Sized {
    fn from_value(value: Value) -> TqlResult<Self>;
}

fn mismatch<T>(expected: &str, actual: &Value) -> TqlResult<T> {
    Err(TqlError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    })
}

// 기본 타입 구현
impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> TqlResult<Self> {
        Ok(value)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int32(self)
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Int32(v) => Ok(v),
            other => mismatch("Int32", &other),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int64(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Int64(v) => Ok(v),
            Value::Int32(v) => Ok(i64::from(v)),
            other => mismatch("Int64", &other),
        }
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int64(i64::from(self))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> TqlResult<Self> {
        let v = i64::from_value(value)?;
        u32::try_from(v).map_err(|_| TqlError::TypeMismatch {
            expected: "u32".to_string(),
            actual: format!("Int64({v})"),
        })
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float64(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Float64(v) => Ok(v),
            other => mismatch("Float64", &other),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => mismatch("Boolean", &other),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Utf8(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Utf8(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Utf8(v) => Ok(v),
            other => mismatch("Utf8", &other),
        }
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> TqlResult<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => mismatch("Bytes", &other),
        }
    }
}

// Option<T> 구현
impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> TqlResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_value(value)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_null() {
        assert_eq!(None::<i64>.into_value(), Value::Null);
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(Value::Int64(4)).unwrap(),
            Some(4)
        );
    }

    #[test]
    fn i64_accepts_int32() {
        assert_eq!(i64::from_value(Value::Int32(9)).unwrap(), 9);
    }

    #[test]
    fn type_mismatch_names_kinds() {
        let err = String::from_value(Value::Int64(1)).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected Utf8, got Int64");
    }

    #[test]
    fn u32_rejects_out_of_range() {
        assert!(u32::from_value(Value::Int64(-1)).is_err());
        assert_eq!(u32::from_value(Value::Int64(42)).unwrap(), 42);
    }
}
