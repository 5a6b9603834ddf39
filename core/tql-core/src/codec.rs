//! Record Codec — typed records to positional tuples and back.
//!
//! A [`Tuple`] is the store's native shape: a table tag followed by one value
//! per attribute in schema order. Tuples are built immediately before a store
//! call and dropped right after decoding.

use crate::api::Record;
use crate::error::{TqlError, TqlResult};
use crate::schema::TableSchema;
use crate::value::Value;

/// Tag + values in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    table: String,
    values: Vec<Value>,
}

impl Tuple {
    /// Assemble a tuple from its parts without schema checks.
    pub fn from_parts(table: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            values,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Tuple length including the tag position.
    pub fn len(&self) -> usize {
        self.values.len() + 1
    }

    /// Never true: every tuple carries its tag.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The primary key (first attribute), if any.
    pub fn key(&self) -> Option<&Value> {
        self.values.first()
    }
}

/// Encode a record into its tuple.
///
/// Fails with `SchemaMismatch` when the record type's attribute list (count or
/// order) differs from the registered schema, or when the record yields a
/// different number of values than it declares.
pub fn encode<R: Record>(schema: &TableSchema, record: &R) -> TqlResult<Tuple> {
    check_layout::<R>(schema)?;
    let values = record.to_values();
    if values.len() != schema.arity() {
        return Err(TqlError::SchemaMismatch {
            table: schema.name().to_string(),
            expected: schema.attributes().to_vec(),
            actual: R::ATTRIBUTES[..values.len().min(R::ATTRIBUTES.len())]
                .iter()
                .map(|a| a.to_string())
                .collect(),
        });
    }
    Ok(Tuple::from_parts(schema.name(), values))
}

/// Decode a tuple into a record.
///
/// Fails with `MalformedTuple` when the tuple length is not arity + 1 or its tag
/// names another table.
pub fn decode<R: Record>(schema: &TableSchema, tuple: Tuple) -> TqlResult<R> {
    if tuple.len() != schema.arity() + 1 {
        return Err(TqlError::MalformedTuple {
            table: schema.name().to_string(),
            reason: format!(
                "expected length {}, got {}",
                schema.arity() + 1,
                tuple.len()
            ),
        });
    }
    if tuple.table != schema.name() {
        return Err(TqlError::MalformedTuple {
            table: schema.name().to_string(),
            reason: format!("tag '{}' does not name this table", tuple.table),
        });
    }
    check_layout::<R>(schema)?;
    R::from_values(tuple.values)
}

/// The record type must declare exactly the schema's attributes, in order.
pub(crate) fn check_layout<R: Record>(schema: &TableSchema) -> TqlResult<()> {
    let matches = R::ATTRIBUTES.len() == schema.arity()
        && R::ATTRIBUTES
            .iter()
            .zip(schema.attributes())
            .all(|(a, b)| *a == b.as_str());
    if matches {
        Ok(())
    } else {
        Err(TqlError::SchemaMismatch {
            table: schema.name().to_string(),
            expected: schema.attributes().to_vec(),
            actual: R::ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableKind;

    #[derive(Debug, Clone, PartialEq, crate::Record)]
    #[tql(table_name = "person")]
    struct Person {
        id: i64,
        name: String,
        age: i32,
    }

    fn schema() -> TableSchema {
        Person::schema(TableKind::Set).unwrap()
    }

    #[test]
    fn encode_places_values_in_schema_order() {
        let p = Person {
            id: 1,
            name: "A".into(),
            age: 30,
        };
        let tuple = encode(&schema(), &p).unwrap();
        assert_eq!(tuple.table(), "person");
        assert_eq!(tuple.len(), 4);
        assert_eq!(
            tuple.values(),
            &[Value::Int64(1), Value::Utf8("A".into()), Value::Int32(30)]
        );
        assert_eq!(tuple.key(), Some(&Value::Int64(1)));
    }

    #[test]
    fn decode_inverts_encode() {
        let p = Person {
            id: 2,
            name: "B".into(),
            age: 40,
        };
        let s = schema();
        let back: Person = decode(&s, encode(&s, &p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn encode_rejects_reordered_schema() {
        let s = TableSchema::new("person", ["id", "age", "name"], TableKind::Set).unwrap();
        let p = Person {
            id: 1,
            name: "A".into(),
            age: 30,
        };
        assert!(matches!(
            encode(&s, &p),
            Err(TqlError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let tuple = Tuple::from_parts("person", vec![Value::Int64(1)]);
        assert!(matches!(
            decode::<Person>(&schema(), tuple),
            Err(TqlError::MalformedTuple { .. })
        ));
    }

    #[test]
    fn decode_rejects_foreign_tag() {
        let tuple = Tuple::from_parts(
            "animal",
            vec![Value::Int64(1), Value::Utf8("A".into()), Value::Int32(3)],
        );
        assert!(matches!(
            decode::<Person>(&schema(), tuple),
            Err(TqlError::MalformedTuple { .. })
        ));
    }

    #[test]
    fn decode_surfaces_type_mismatch() {
        let tuple = Tuple::from_parts(
            "person",
            vec![Value::Utf8("x".into()), Value::Utf8("A".into()), Value::Int32(3)],
        );
        assert!(matches!(
            decode::<Person>(&schema(), tuple),
            Err(TqlError::TypeMismatch { .. })
        ));
    }
}
