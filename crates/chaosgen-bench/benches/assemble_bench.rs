//! Assembly and rendering benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use chaosgen_core::{CombinationStrategy, FullEnumeration, ParameterMatrix, assemble, assemble_batch};
use chaosgen_harness::yaml;

fn bench_assemble_one(c: &mut Criterion) {
    let matrix = ParameterMatrix::builtin().expect("builtin matrix");
    c.bench_function("assemble_one", |b| {
        b.iter(|| {
            criterion::black_box(
                assemble("packet_loss", "all_both", "moderate", &matrix).expect("assemble"),
            )
        });
    });
}

fn bench_assemble_batch(c: &mut Criterion) {
    let matrix = ParameterMatrix::builtin().expect("builtin matrix");
    let combos = FullEnumeration.generate(&matrix).expect("generate");
    let mut group = c.benchmark_group("assemble_batch_full");
    for workers in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter(|| criterion::black_box(assemble_batch(&matrix, &combos, w).expect("batch")));
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let matrix = ParameterMatrix::builtin().expect("builtin matrix");
    let record = assemble("dns_latency", "validator1_both", "severe", &matrix).expect("assemble");
    c.bench_function("render_record_yaml", |b| {
        b.iter(|| criterion::black_box(yaml::render_record(&record).expect("render")));
    });
}

criterion_group!(
    benches,
    bench_assemble_one,
    bench_assemble_batch,
    bench_render
);
criterion_main!(benches);
