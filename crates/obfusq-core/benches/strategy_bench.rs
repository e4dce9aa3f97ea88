//! Benchmarks for the rewrite strategies
//!
//! Run with: cargo bench -p obfusq-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use obfusq_core::{EquivalenceLibrary, Strategy, StrategyOptions};
use obfusq_ir::Circuit;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Benchmark each strategy over growing random programs
fn bench_strategies(c: &mut Criterion) {
    let library = EquivalenceLibrary::builtin();
    let options = StrategyOptions::default();

    for strategy in Strategy::ALL {
        let mut group = c.benchmark_group(strategy.name());

        for num_qubits in &[2_u32, 5, 10] {
            let mut rng = StdRng::seed_from_u64(0);
            let circuit = Circuit::random(*num_qubits, 20, &mut rng).unwrap();

            group.bench_with_input(
                BenchmarkId::new("random_depth20", num_qubits),
                &circuit,
                |b, circuit| {
                    b.iter(|| {
                        strategy
                            .apply(black_box(circuit), &library, &options, &mut rng)
                            .unwrap()
                    });
                },
            );
        }

        group.finish();
    }
}

/// Benchmark loading and validating a library
fn bench_library(c: &mut Criterion) {
    c.bench_function("builtin_validate", |b| {
        let library = EquivalenceLibrary::builtin();
        b.iter(|| black_box(&library).validate().unwrap());
    });
}

criterion_group!(benches, bench_strategies, bench_library);
criterion_main!(benches);
