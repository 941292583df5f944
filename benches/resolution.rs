//! Benchmark: Resolutions of small p-groups
//!
//! Each iteration resolves the trivial module from scratch in a fresh
//! directory, so the time includes writing every slice and differential.
//!
//! Groups tested:
//! - Klein four group up to degree 6
//! - (Z/3)^2 up to degree 4
//! - Z/8 with varying block sizes, to see the cost of paging

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pgroup_resolution::*;
use std::time::Duration;
use tempfile::TempDir;

fn resolve(group: &GroupAlgebra, config: &ResolutionConfig, degree: usize) -> usize {
    let dir = TempDir::new().unwrap();
    let stem = format!("{}/", dir.path().display());
    let mut res = Resolution::with_config(group.clone(), &stem, config.clone()).unwrap();
    res.ensure_projective_known(degree).unwrap();
    res.rank(degree).unwrap()
}

fn bench_elementary_abelian(c: &mut Criterion) {
    let mut group = c.benchmark_group("elementary_abelian");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(30));

    let klein = elementary_abelian_group(2, 2).unwrap();
    let klein_config = ResolutionConfig::for_prime(2);
    group.bench_function("klein_four_degree6", |b| {
        b.iter(|| black_box(resolve(&klein, &klein_config, 6)))
    });

    let e9 = elementary_abelian_group(3, 2).unwrap();
    let e9_config = ResolutionConfig::for_prime(3);
    group.bench_function("z3_squared_degree4", |b| {
        b.iter(|| black_box(resolve(&e9, &e9_config, 4)))
    });

    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_size");
    group.sample_size(10);

    let z8 = cyclic_group(2, 3).unwrap();
    for block_size in [1usize, 4, 64] {
        let config = ResolutionConfig::for_prime(2).with_block_size(block_size);
        group.bench_with_input(BenchmarkId::new("z8_degree6", block_size), &config, |b, config| {
            b.iter(|| black_box(resolve(&z8, config, 6)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_elementary_abelian, bench_block_sizes);
criterion_main!(benches);
