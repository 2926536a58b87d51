//! Benchmarks for the frequency-to-time transform

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex64;
use sparview_core::analysis::{ResponseKind, TimeDomainOptions, Window, WindowKind};
use sparview_core::frequency::Frequency;
use sparview_core::Curve;
use std::f64::consts::PI;

/// Ideal delay line sampled from just above DC.
fn delay_curve(npoints: usize) -> Curve {
    let f: Vec<f64> = (1..=npoints).map(|i| i as f64 * 20e9 / npoints as f64).collect();
    let v: Vec<Complex64> = f
        .iter()
        .map(|&x| Complex64::from_polar(0.9, -2.0 * PI * x * 1e-9))
        .collect();
    Curve::new(
        "delay",
        Frequency::from_hz(f).unwrap(),
        v,
        Complex64::new(50.0, 0.0),
    )
    .unwrap()
}

fn bench_impulse_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("impulse_response");
    let opts = TimeDomainOptions {
        kind: ResponseKind::Impulse,
        window: Window {
            kind: WindowKind::Kaiser,
            param: 6.0,
        },
        shift_s: 0.0,
    };

    for npoints in [64, 256, 1024, 4096] {
        let curve = delay_curve(npoints);
        group.bench_with_input(BenchmarkId::from_parameter(npoints), &npoints, |b, _| {
            b.iter(|| black_box(curve.time_domain(&opts)))
        });
    }
    group.finish();
}

fn bench_step_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_response");
    let opts = TimeDomainOptions {
        kind: ResponseKind::Step,
        window: Window {
            kind: WindowKind::Hamming,
            param: 0.0,
        },
        shift_s: 0.0,
    };

    for npoints in [256, 1024] {
        let curve = delay_curve(npoints);
        group.bench_with_input(BenchmarkId::from_parameter(npoints), &npoints, |b, _| {
            b.iter(|| black_box(curve.time_domain(&opts)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_impulse_response, bench_step_response);
criterion_main!(benches);
