//! Assignment benchmarks
//!
//! Measures the three hot paths of `get_variant`: weighted selection, the
//! stored-assignment round-trip through the cookie codec, and a fresh
//! assignment that writes back.
//!
//! Run with: cargo bench --bench assignment_benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_ab::store::{codec, MemoryMedium};
use trueno_ab::{
    Assignment, AssignmentEngine, AssignmentSet, Experiment, Registry, Variant, VariantSelector,
};

const VARIANT_COUNTS: [usize; 3] = [2, 8, 64];
const STORED_EXPERIMENTS: usize = 50;

fn variants(n: usize) -> Vec<Variant> {
    (0..n)
        .map(|i| Variant::new(format!("v{i}"), (i + 1) as f64))
        .collect()
}

/// Benchmark weighted selection across variant counts
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("variant_select");

    for n in VARIANT_COUNTS {
        let vs = variants(n);
        let mut selector = VariantSelector::from_seed(42);
        group.bench_with_input(BenchmarkId::new("weighted", n), &vs, |b, vs| {
            b.iter(|| selector.select(black_box(vs)).map(str::len));
        });
    }

    group.finish();
}

/// Benchmark decoding a cookie holding many assignments
fn bench_cookie_decode(c: &mut Criterion) {
    let set: AssignmentSet = (0..STORED_EXPERIMENTS)
        .map(|i| {
            let id = format!("experiment-{i}");
            let assignment = Assignment::new(id.as_str(), "B", 1_700_000_000_000);
            (id, assignment)
        })
        .collect();
    let raw = codec::encode(&set).expect("encode");

    c.bench_function("cookie_decode_50", |b| {
        b.iter(|| codec::decode(black_box(&raw)).map(|s| s.len()));
    });
}

/// Benchmark stored vs fresh resolution through the engine
fn bench_get_variant(c: &mut Criterion) {
    let registry = Arc::new(
        Registry::builder()
            .experiment(Experiment::new("hero", variants(4)).expect("experiment"))
            .build()
            .expect("registry"),
    );
    let mut group = c.benchmark_group("get_variant");

    let jar = MemoryMedium::new();
    let mut engine = AssignmentEngine::builder(Arc::clone(&registry), &jar)
        .seed(1)
        .build();
    engine.get_variant("hero");
    group.bench_function("stored", |b| {
        b.iter(|| engine.get_variant(black_box("hero")));
    });

    let jar = MemoryMedium::new();
    let mut engine = AssignmentEngine::builder(Arc::clone(&registry), &jar)
        .seed(1)
        .build();
    group.bench_function("fresh", |b| {
        b.iter(|| {
            engine.clear_assignments();
            engine.get_variant(black_box("hero"))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_select, bench_cookie_decode, bench_get_variant);
criterion_main!(benches);
