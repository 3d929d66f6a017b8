use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skillmap::{Cell, FeatureTable, OccupationGraph, OccupationRow};

/// Synthetic table: `size` occupations scattered around a few skill profiles
fn synthetic_table(size: usize, features: usize) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(11);
    let profiles: Vec<Vec<f64>> = (0..5)
        .map(|_| (0..features).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect();

    let rows = (0..size)
        .map(|i| {
            let profile = &profiles[i % profiles.len()];
            OccupationRow {
                index: i,
                code: format!("{:02}-{:04}.00", i % 100, i),
                title: format!("Occupation {}", i),
                cells: profile
                    .iter()
                    .map(|v| Cell::Number(v + rng.gen_range(-0.1..0.1)))
                    .collect(),
            }
        })
        .collect();

    FeatureTable::new((0..features).map(|j| format!("Feature {}", j)).collect(), rows).unwrap()
}

/// Benchmark the sanitize → project → neighbor graph pipeline
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("occupation_graph");

    for size in [100, 1000].iter() {
        let table = synthetic_table(*size, 120);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let built = OccupationGraph::build(&table).unwrap();
                criterion::black_box(built.graph.edges.len());
            });
        });
    }
    group.finish();
}

/// Benchmark column sanitization alone
fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    for size in [100, 1000].iter() {
        let table = synthetic_table(*size, 120);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| criterion::black_box(table.sanitize().unwrap().ncols()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_sanitize);
criterion_main!(benches);
