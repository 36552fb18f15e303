#![allow(missing_docs)]
//! Benchmarks for the legacy random generator.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use kiln_utils::random::{LegacyRandom, Random};

fn bench_legacy_random(c: &mut Criterion) {
    let mut rand = LegacyRandom::from_seed(12345);

    c.bench_function("legacy_next_i32_bounded_pow2", |b| {
        b.iter(|| black_box(rand.next_i32_bounded(black_box(16))));
    });

    c.bench_function("legacy_next_i32_bounded", |b| {
        b.iter(|| black_box(rand.next_i32_bounded(black_box(6))));
    });

    c.bench_function("legacy_next_f64", |b| {
        b.iter(|| black_box(rand.next_f64()));
    });
}

criterion_group!(benches, bench_legacy_random);
criterion_main!(benches);
