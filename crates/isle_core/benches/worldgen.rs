//! World generation and placement benchmarks for isle_core.
//!
//! Run with: `cargo bench -p isle_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use isle_core::prelude::*;

/// Full pipeline at each preset size.
pub fn worldgen_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_world");
    for (name, config) in [
        ("small", WorldConfig::small()),
        ("standard", WorldConfig::standard()),
        ("large", WorldConfig::large()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let mut rng = SeededRng::new(42);
                black_box(generate_world(config, &mut rng))
            });
        });
    }
    group.finish();
}

/// Best-placement search on a standard world with a capital already placed.
pub fn placement_benchmark(c: &mut Criterion) {
    let mut session = Session::new(42, WorldConfig::standard());
    let _ = session.place_capital();

    c.bench_function("best_placement_market", |b| {
        b.iter(|| black_box(session.best_placement(StructureKind::Market)));
    });
    c.bench_function("available_placements_house", |b| {
        b.iter(|| black_box(session.available_placements(StructureKind::House)));
    });
}

criterion_group!(benches, worldgen_benchmark, placement_benchmark);
criterion_main!(benches);
