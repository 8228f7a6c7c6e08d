//! Benchmarks for the incremental moving-average path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tickflow_indicators::MovingAverageSet;

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

/// Naive reference: rescan the trailing window on every sample.
fn rescan_sma(data: &[f64], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        if i + 1 >= window {
            let tail = &data[i + 1 - window..=i];
            out.push(tail.iter().sum::<f64>() / window as f64);
        }
    }
    out
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("incremental", size), &data, |b, data| {
            b.iter(|| {
                let mut set = MovingAverageSet::new(&[9, 50, 200]);
                for &close in black_box(data) {
                    set.push(close);
                }
                set.values()
            })
        });

        group.bench_with_input(BenchmarkId::new("rescan", size), &data, |b, data| {
            b.iter(|| rescan_sma(black_box(data), black_box(200)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sma);
criterion_main!(benches);
