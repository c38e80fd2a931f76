use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use krda_core::rules::{RuleLeaf, RuleOp, RuleSet};
use krda_core::schema::ColumnType;
use krda_core::types::Scalar;
use krda_filter::FilterJob;
use krda_mem::Heap;
use krda_table::{Table, TableBuilder};

fn build_table(heap: &Heap, rows: u32) -> Table {
    let mut builder = TableBuilder::new()
        .column("id", ColumnType::UInt32)
        .column_with_size("name", ColumnType::String, 18)
        .column("score", ColumnType::Float32);
    for id in 0..rows {
        builder
            .push_row(&[
                Scalar::Int(id as i64),
                Scalar::Str(format!("row-{}", id % 1000)),
                Scalar::Float((id % 10_000) as f32 / 100.0),
            ])
            .expect("row encode");
    }
    Table::load(heap, &builder.finish()).expect("table load")
}

fn bench_filter_scan(c: &mut Criterion) {
    let heap = Heap::with_capacity(256 * 1024 * 1024);
    let table = build_table(&heap, 100_000);

    let rules: RuleSet = vec![
        vec![
            RuleLeaf::new("score", RuleOp::MoreThan, 80.0f64),
            RuleLeaf::new("name", RuleOp::Contains, "ROW-1"),
        ],
        vec![RuleLeaf::new("id", RuleOp::LessThan, 500i64)],
    ];

    let mut group = c.benchmark_group("filter_scan_100k");
    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    let output = FilterJob::new(&heap, &table)
                        .workers(workers)
                        .run(&rules)
                        .expect("filter run");
                    let count = output.count;
                    output.free(&heap).expect("free result");
                    count
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_filter_scan);
criterion_main!(benches);
