use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabforge_core::Dataset;
use tabforge_expr::{evaluate, parse_expression, validate};

fn sample(rows: usize) -> Dataset {
    Dataset::builder()
        .column("Price", (0..rows).map(|i| (i % 97) as f64))
        .column("Quantity", (0..rows).map(|i| (i % 13) as f64 + 1.0))
        .build()
        .unwrap()
}

fn parse_benchmark(c: &mut Criterion) {
    c.bench_function("parse_expression", |b| {
        b.iter(|| parse_expression(black_box("(Price * Quantity - 5) / 2 > 50 and not Price == 0")).unwrap())
    });
}

fn validate_benchmark(c: &mut Criterion) {
    let dataset = sample(16);
    c.bench_function("validate", |b| {
        b.iter(|| validate(black_box("Price * Quantity > 50"), &dataset, "HighValue").unwrap())
    });
}

fn evaluate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for rows in [1_000, 10_000, 100_000] {
        let dataset = sample(rows);
        group.bench_with_input(BenchmarkId::new("arithmetic", rows), &dataset, |b, dataset| {
            b.iter(|| evaluate(black_box("Price * Quantity"), dataset).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("flag", rows), &dataset, |b, dataset| {
            b.iter(|| evaluate(black_box("Price * Quantity > 50 or Price == 1"), dataset).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, parse_benchmark, validate_benchmark, evaluate_benchmark);
criterion_main!(benches);
