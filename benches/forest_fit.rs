/// Isolation Forest fit and scoring throughput
///
/// Compares parallel vs. sequential tree construction and measures batch
/// scoring over generated telemetry tables.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use satwatch::dataset::{extract, FeatureMatrix};
use satwatch::forest::{Forest, ForestParams};
use satwatch::generator::{generate, GeneratorConfig};
use std::time::Duration;

fn telemetry(rows: usize) -> FeatureMatrix {
    let data = generate(&GeneratorConfig {
        rows,
        seed: Some(42),
        ..GeneratorConfig::default()
    })
    .expect("Failed to generate telemetry");
    extract(&data.rows).expect("Generated telemetry is valid")
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_fit");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(30);

    let matrix = telemetry(1000);
    for trees in [10usize, 100] {
        group.throughput(Throughput::Elements(trees as u64));

        group.bench_with_input(BenchmarkId::new("parallel", trees), &trees, |b, &trees| {
            let params = ForestParams::new(trees, 256);
            b.iter(|| black_box(Forest::fit(&matrix, &params, Some(42)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("sequential", trees), &trees, |b, &trees| {
            let params = ForestParams::new(trees, 256).with_parallel(false);
            b.iter(|| black_box(Forest::fit(&matrix, &params, Some(42)).unwrap()));
        });
    }

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_score");
    group.measurement_time(Duration::from_secs(10));

    for rows in [1_000usize, 10_000] {
        let matrix = telemetry(rows);
        let forest = Forest::fit(&matrix, &ForestParams::default(), Some(42)).unwrap();
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("score_matrix", rows), &matrix, |b, m| {
            b.iter(|| black_box(forest.score_matrix(m)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_score);
criterion_main!(benches);
