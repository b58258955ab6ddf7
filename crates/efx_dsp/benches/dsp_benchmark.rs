//! Performance benchmarks for the DSP units
//!
//! Run with: cargo bench -p efx_dsp

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use efx_dsp::{
    design, soft_limit, BiquadFilter, FilterType, PendingCoefficients, ReverbChannel,
    ReverbParams,
};

fn test_signal(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.001).sin()).collect()
}

fn benchmark_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("biquad");

    for size in [64, 256, 1024] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("peaking_{}_samples", size), |b| {
            let pending = Arc::new(PendingCoefficients::new());
            pending.set_design(design(FilterType::Peaking, 48000.0, 1000.0, 1.0, 6.0));
            let mut filter = BiquadFilter::new(pending);
            let mut buffer = test_signal(size);

            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = filter.process(black_box(*sample));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_coefficient_update(c: &mut Criterion) {
    c.bench_function("biquad_set_design", |b| {
        let pending = PendingCoefficients::new();
        let mut gain = 0.0_f32;

        b.iter(|| {
            // Simulate dragging a gain slider
            pending.set_design(design(FilterType::LowShelf, 48000.0, 100.0, 0.707, gain));
            gain = (gain + 1.0) % 24.0;
        });
    });
}

fn benchmark_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverb");

    for size in [64, 256, 1024] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("channel_{}_samples", size), |b| {
            let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
            let mut buffer = test_signal(size);

            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = channel.process(black_box(*sample));
                }
            });
        });
    }

    group.bench_function("rebuild", |b| {
        let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        let mut room = 0.2_f32;

        b.iter(|| {
            channel.rebuild(ReverbParams {
                room_size: room,
                ..ReverbParams::default()
            });
            room = if room > 0.9 { 0.2 } else { room + 0.05 };
        });
    });

    group.finish();
}

fn benchmark_limiter(c: &mut Criterion) {
    c.bench_function("soft_limit_1024_samples", |b| {
        let mut buffer: Vec<f32> = test_signal(1024).iter().map(|s| s * 2.0).collect();

        b.iter(|| {
            for sample in black_box(&mut buffer).iter_mut() {
                *sample = soft_limit(*sample);
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_biquad,
    benchmark_coefficient_update,
    benchmark_reverb,
    benchmark_limiter
);

criterion_main!(benches);
