// Match 성능 벤치마크
//
// Section 1: match spec 컴파일 (패턴 + 가드)
// Section 2: MemoryStore select (키 바인딩 vs 전체 스캔)

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tql_core::pattern::{compile_conditions, compile_match};
use tql_core::{
    CompareOp, Condition, Database, Guard, MemoryStore, QueryOptions, Record, TableKind,
};

#[derive(Debug, Clone, PartialEq, Record)]
#[tql(table_name = "person")]
struct Person {
    id: i64,
    name: String,
    age: i32,
}

// ═══════════════════════════════════════════════════════════════════════════
// Section 1: 컴파일
// ═══════════════════════════════════════════════════════════════════════════

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let schema = Person::schema(TableKind::Set).unwrap();

    let pattern = Person::pattern().bind("name", "A");
    let guards = [Guard::compare("age", CompareOp::Gt, 35).and(Guard::compare(
        "id",
        CompareOp::Ne,
        7i64,
    ))];
    group.bench_function("pattern_with_guards", |b| {
        b.iter(|| compile_match(black_box(&schema), black_box(&pattern), &guards, None).unwrap())
    });

    let conditions = [
        Condition::new("age", CompareOp::Ge, 18),
        Condition::new("name", CompareOp::Ne, "Z"),
    ];
    group.bench_function("conditions_projected", |b| {
        b.iter(|| {
            compile_conditions(black_box(&schema), black_box(&conditions), Some(&["name"][..]))
                .unwrap()
        })
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Section 2: select
// ═══════════════════════════════════════════════════════════════════════════

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");

    let db = Database::new(MemoryStore::new());
    db.create_table::<Person>(TableKind::OrderedSet).unwrap();
    db.transaction(|tx| {
        for i in 0..10_000i64 {
            tx.write(
                Person {
                    id: i,
                    name: format!("p{}", i % 100),
                    age: (i % 90) as i32,
                },
                None,
            )?;
        }
        Ok(())
    })
    .unwrap();

    group.bench_function("bound_key", |b| {
        let pattern = Person::pattern().bind("id", 4_242i64);
        b.iter(|| {
            db.transaction(|tx| tx.match_records::<Person>(black_box(&pattern), &[], QueryOptions::new()))
                .unwrap()
        })
    });

    group.bench_function("scan_with_guard", |b| {
        let conditions = [Condition::new("age", CompareOp::Gt, 80)];
        b.iter(|| {
            db.transaction(|tx| tx.select::<Person>(black_box(&conditions), QueryOptions::new()))
                .unwrap()
        })
    });

    group.bench_function("scan_limit_10", |b| {
        b.iter(|| {
            db.transaction(|tx| tx.all::<Person>(QueryOptions::new().limit(10)))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_select);
criterion_main!(benches);
