//! Operator Benchmarks
//!
//! Benchmarks for the materializing operators:
//! - External merge sort, with and without distinct
//! - Equijoin algorithms (hash, nested loop, merge) on the same inputs
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench --bench operators
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relq::materialize::{HashJoinPlan, MergeJoinPlan, NestedJoinPlan, OrderData, SortPlan};
use relq::query::{Plan, PlanRef, TablePlan};
use relq::storage::{Catalog, Transaction};
use relq::types::{Constant, Schema};
use std::sync::Arc;

fn int_table(catalog: &Catalog, tx: &Transaction, name: &str, key: &str, rows: usize, modulo: i64) -> PlanRef {
    catalog
        .create_table(tx, name, Schema::new().with_int(key).with_int(format!("{}val", key)))
        .unwrap();
    for i in 0..rows as i64 {
        let k = (i * 7919) % modulo;
        catalog
            .insert_row(name, &[Constant::from(k), Constant::from(i)])
            .unwrap();
    }
    Arc::new(TablePlan::new(catalog, name).unwrap())
}

fn drain(plan: &dyn Plan) -> usize {
    let mut scan = plan.open().unwrap();
    let mut count = 0;
    while scan.next().unwrap() {
        count += 1;
    }
    scan.close().unwrap();
    count
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for rows in [1_000usize, 10_000] {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let input = int_table(&catalog, &tx, "t", "k", rows, 997);
        group.throughput(Throughput::Elements(rows as u64));

        let plan = SortPlan::new(&tx, Arc::clone(&input), OrderData::new().asc("k")).unwrap();
        group.bench_with_input(BenchmarkId::new("order_by", rows), &plan, |b, plan| {
            b.iter(|| black_box(drain(plan)));
        });

        let plan =
            SortPlan::with_distinct(&tx, Arc::clone(&input), OrderData::new().asc("k"), true)
                .unwrap();
        group.bench_with_input(BenchmarkId::new("distinct", rows), &plan, |b, plan| {
            b.iter(|| black_box(drain(plan)));
        });
    }

    group.finish();
}

fn bench_joins(c: &mut Criterion) {
    let mut group = c.benchmark_group("equijoin");
    group.sample_size(20);

    for rows in [200usize, 1_000] {
        let tx = Transaction::default();
        let catalog = Catalog::new();
        let left = int_table(&catalog, &tx, "l", "lk", rows, rows as i64 / 2);
        let right = int_table(&catalog, &tx, "r", "rk", rows, rows as i64 / 2);
        group.throughput(Throughput::Elements(rows as u64));

        let hash = HashJoinPlan::new(&tx, Arc::clone(&left), Arc::clone(&right), "lk", "rk").unwrap();
        group.bench_with_input(BenchmarkId::new("hash", rows), &hash, |b, plan| {
            b.iter(|| black_box(drain(plan)));
        });

        let nested = NestedJoinPlan::new(Arc::clone(&left), Arc::clone(&right), "lk", "rk").unwrap();
        group.bench_with_input(BenchmarkId::new("nested_loop", rows), &nested, |b, plan| {
            b.iter(|| black_box(drain(plan)));
        });

        let merge = MergeJoinPlan::new(&tx, left, right, "lk", "rk").unwrap();
        group.bench_with_input(BenchmarkId::new("merge", rows), &merge, |b, plan| {
            b.iter(|| black_box(drain(plan)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort, bench_joins);
criterion_main!(benches);
