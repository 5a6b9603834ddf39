// Record Codec 속성 테스트

use proptest::prelude::*;
use tql_core::codec::{decode, encode};
use tql_core::{Record, TableKind, TableSchema, Value};

#[derive(Debug, Clone, PartialEq, Record)]
#[tql(table_name = "sample")]
struct Sample {
    key: i64,
    label: String,
    flag: bool,
    score: Option<i32>,
    blob: Vec<u8>,
}

fn sample_strategy() -> impl Strategy<Value = Sample> {
    (
        any::<i64>(),
        ".{0,24}",
        any::<bool>(),
        proptest::option::of(any::<i32>()),
        proptest::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(key, label, flag, score, blob)| Sample {
            key,
            label,
            flag,
            score,
            blob,
        })
}

fn schema() -> TableSchema {
    Sample::schema(TableKind::Set).expect("valid schema")
}

proptest! {
    #[test]
    fn encode_decode_round_trip(record in sample_strategy()) {
        let schema = schema();
        let tuple = encode(&schema, &record).unwrap();
        prop_assert_eq!(tuple.table(), "sample");
        prop_assert_eq!(tuple.len(), 6);
        prop_assert_eq!(tuple.key(), Some(&Value::Int64(record.key)));
        let back: Sample = decode(&schema, tuple).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn value_order_is_total(a in any::<i64>(), b in any::<i64>()) {
        let (x, y) = (Value::Int64(a), Value::Int64(b));
        prop_assert_eq!(x.cmp(&y), a.cmp(&b));
        prop_assert!(Value::Null < x);
        prop_assert!(x < Value::Utf8(String::new()));
    }
}
