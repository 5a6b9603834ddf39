//! derive(Record) 매크로 테스트

use tql_core::api::Record;
use tql_core::{TableKind, TqlError, Value};
use tql_derive::Record;

#[derive(Debug, Clone, PartialEq, Record)]
#[tql(table_name = "users")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Record)]
pub struct Counter {
    pub key: String,
    pub hits: u32,
}

#[test]
fn test_table_name() {
    assert_eq!(User::TABLE_NAME, "users");
    assert_eq!(Counter::TABLE_NAME, "counter");
}

#[test]
fn test_attributes() {
    assert_eq!(User::ATTRIBUTES, &["id", "name", "age", "email"]);
    let schema = User::schema(TableKind::Set).unwrap();
    assert_eq!(schema.arity(), 4);
    assert_eq!(schema.key_attribute(), "id");
}

#[test]
fn test_to_values_in_declaration_order() {
    let user = User {
        id: 7,
        name: "Alice".into(),
        age: 30,
        email: None,
    };
    assert_eq!(
        user.to_values(),
        vec![
            Value::Int64(7),
            Value::Utf8("Alice".into()),
            Value::Int32(30),
            Value::Null
        ]
    );
}

#[test]
fn test_from_values() {
    let user = User::from_values(vec![
        Value::Int64(1),
        Value::Utf8("Bob".into()),
        Value::Int32(41),
        Value::Utf8("bob@example.com".into()),
    ])
    .unwrap();
    assert_eq!(user.email.as_deref(), Some("bob@example.com"));
}

#[test]
fn test_from_values_wrong_length() {
    let err = Counter::from_values(vec![Value::Utf8("k".into())]).unwrap_err();
    assert!(matches!(err, TqlError::MalformedTuple { .. }));
}

#[test]
fn test_from_values_wrong_type() {
    let err = Counter::from_values(vec![Value::Utf8("k".into()), Value::Utf8("x".into())])
        .unwrap_err();
    assert!(matches!(err, TqlError::TypeMismatch { .. }));
}
