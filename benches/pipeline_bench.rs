//! Pipeline throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lazypipe::{Enumerable, Iter};

fn benchmark_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_map");
    for size in [1_000usize, 100_000] {
        let data: Vec<u64> = (0..size as u64).collect();
        group.bench_with_input(BenchmarkId::new("pipeline", size), &data, |b, data| {
            let mut pipeline = Enumerable::from_slice(data)
                .filter(|x: &u64| x % 3 == 0)
                .map(|x| x * 2)
                .map(|x| x + 1);
            b.iter(|| black_box(pipeline.to_vec().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("std", size), &data, |b, data| {
            b.iter(|| {
                black_box(
                    data.iter()
                        .filter(|x| *x % 3 == 0)
                        .map(|x| x * 2 + 1)
                        .collect::<Vec<_>>(),
                )
            });
        });
    }
    group.finish();
}

fn benchmark_order_by(c: &mut Criterion) {
    let data: Vec<i64> = (0..10_000i64).map(|x| (x * 7919) % 10_007).collect();
    c.bench_function("order_by_10k", |b| {
        let mut sorted = Enumerable::from_slice(&data).order_by(|a: &i64, b: &i64| a < b);
        b.iter(|| black_box(sorted.first().unwrap()));
    });
}

fn benchmark_boxed(c: &mut Criterion) {
    let data: Vec<u32> = (0..10_000).collect();
    c.bench_function("enumerator_count_10k", |b| {
        let mut boxed = Enumerable::from_slice(&data)
            .filter(|x: &u32| x % 2 == 1)
            .into_enumerator();
        b.iter(|| black_box(boxed.count().unwrap()));
    });
    c.bench_function("iter_count_10k", |b| {
        b.iter(|| black_box(Iter::from_slice(&data).count().unwrap()));
    });
}

criterion_group!(benches, benchmark_streaming, benchmark_order_by, benchmark_boxed);
criterion_main!(benches);
