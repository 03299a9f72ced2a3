//! Benchmarks for the contraction kernels.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensal_core::labels::parse_indices;
use tensal_core::DenseData;
use tensal_kernels::{contract, permute};

fn bench_matmul(crit: &mut Criterion) {
    let n = 64;
    let a = DenseData::from_elem(&[n, n], 1.5);
    let b = DenseData::from_elem(&[n, n], 0.5);
    let cinds = parse_indices("ij");
    let ainds = parse_indices("ik");
    let binds = parse_indices("kj");

    crit.bench_function("contract_matmul_64", |bench| {
        bench.iter(|| {
            let mut c = DenseData::zeros(&[n, n]);
            contract(
                &mut c,
                black_box(&a),
                black_box(&b),
                &cinds,
                &ainds,
                &binds,
                1.0,
                0.0,
            )
            .unwrap();
            c
        })
    });
}

fn bench_rank4_permute(crit: &mut Criterion) {
    let a = DenseData::from_elem(&[16, 16, 16, 16], 1.0);
    let cinds = parse_indices("lkji");
    let ainds = parse_indices("ijkl");

    crit.bench_function("permute_rank4_reverse", |bench| {
        bench.iter(|| {
            let mut c = DenseData::zeros(&[16, 16, 16, 16]);
            permute(&mut c, black_box(&a), &cinds, &ainds, 1.0, 0.0).unwrap();
            c
        })
    });
}

fn bench_batched_contraction(crit: &mut Criterion) {
    let a = DenseData::from_elem(&[8, 32, 32], 1.0);
    let b = DenseData::from_elem(&[8, 32, 32], 1.0);
    let cinds = parse_indices("hij");
    let ainds = parse_indices("hik");
    let binds = parse_indices("hkj");

    crit.bench_function("contract_batched_8x32", |bench| {
        bench.iter(|| {
            let mut c = DenseData::zeros(&[8, 32, 32]);
            contract(
                &mut c,
                black_box(&a),
                black_box(&b),
                &cinds,
                &ainds,
                &binds,
                1.0,
                0.0,
            )
            .unwrap();
            c
        })
    });
}

criterion_group!(
    benches,
    bench_matmul,
    bench_rank4_permute,
    bench_batched_contraction
);
criterion_main!(benches);
