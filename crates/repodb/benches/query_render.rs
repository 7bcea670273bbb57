use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use repodb::{Client, Connection, OrmError, OrmResult, ParamType, Query, Statement};

/// Client that never reaches a database; rendering needs none.
struct NullClient;

impl Client for NullClient {
    fn prepare(&self, _sql: &str) -> OrmResult<Box<dyn Statement>> {
        Err(OrmError::database("rendering only"))
    }

    fn begin_transaction(&self) -> OrmResult<()> {
        Ok(())
    }

    fn commit(&self) -> OrmResult<()> {
        Ok(())
    }

    fn roll_back(&self) -> OrmResult<()> {
        Ok(())
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        Ok(0)
    }
}

/// SELECT col0, col1, ... FROM t WHERE (col0 = :col0 && col1 = :col1 ...)
fn build_select(conn: &Connection, n: usize) -> Query {
    let items: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let conditions: Vec<String> = (0..n).map(|i| format!("col{i} = :col{i}")).collect();

    let mut query = conn.select(items, "t", None);
    query.where_(conditions);
    for i in 0..n {
        query.bind_param(format!(":col{i}"), ParamType::Int);
    }
    query
}

fn bench_to_sql(c: &mut Criterion) {
    let conn = Connection::new(NullClient);
    let mut group = c.benchmark_group("query/to_sql");

    for n in [1, 5, 10, 50, 100] {
        let query = build_select(&conn, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let conn = Connection::new(NullClient);
    let mut group = c.benchmark_group("query/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let query = build_select(&conn, n);
                black_box(query.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_nested_conditions(c: &mut Criterion) {
    let conn = Connection::new(NullClient);
    let mut group = c.benchmark_group("query/nested_conditions");

    for depth in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut condition = Query::all_of(["a = :a"]);
                for level in 0..depth {
                    let inner = Query::any_of([format!("b{level} = 1"), format!("c{level} = 2")]);
                    condition = Query::all_of([format!("d{level} = 3")]).with(inner).with(condition);
                }
                let mut query = conn.select("*", "t", Some("x"));
                query
                    .left_join("u", Some("y"), "y.id = x.uid")
                    .where_(condition)
                    .order_by(["RAND()"])
                    .limit(10, Some(20));
                black_box(query.to_sql());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_build_and_render,
    bench_nested_conditions
);
criterion_main!(benches);
