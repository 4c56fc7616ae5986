use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlmapper::prelude::*;

#[derive(Default)]
struct Row {
    id: Option<i64>,
    name: String,
    score: i64,
}

impl Entity for Row {
    fn table_def() -> TableDef {
        TableDef::of::<Self>()
            .name("rows")
            .field(FieldDef::id("id", IdType::AssignId))
            .field(FieldDef::text("name"))
            .field(FieldDef::new("score"))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "score" => self.score.into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
        match field {
            "id" => self.id = value.as_i64(),
            _ => return Err(MapperError::unknown_field("Row", field)),
        }
        Ok(())
    }
}

/// `n` equality predicates followed by a two-value subquery.
fn bench_conditions(c: &mut Criterion) {
    let registry = Registry::new(MapperConfig::new().dialect(Dialect::Postgres)).unwrap();
    let mut group = c.benchmark_group("sql_builder/conditions");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut qb = registry.query_table("t");
                for i in 0..n {
                    qb = qb.eq(format!("col{i}"), i as i64);
                }
                let info = qb
                    .in_query("id", |s| s.table("u").select(["id"]).eq("a", 1).eq("b", 2))
                    .build()
                    .unwrap();
                black_box(info.render_for(Dialect::Postgres));
            });
        });
    }

    group.finish();
}

fn bench_batch_insert(c: &mut Criterion) {
    let registry = Registry::new(MapperConfig::new()).unwrap();
    let rows = registry.mapper::<Row>();
    let mut group = c.benchmark_group("sql_builder/batch_insert");

    for n in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut items: Vec<Row> = (0..n)
                    .map(|i| Row {
                        id: None,
                        name: format!("row{i}"),
                        score: i,
                    })
                    .collect();
                black_box(rows.batch_insert(&mut items).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_conditions, bench_batch_insert);
criterion_main!(benches);
