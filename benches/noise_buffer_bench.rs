//! Benchmarks for graph (re)build costs
//!
//! A fresh noise buffer is generated on every start and profile switch, so
//! it has to stay well under a millisecond.
//!
//! Run with: cargo bench --bench noise_buffer_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use soundscape::{Destination, EngineConfig, NoiseBuffer, SignalGraphBuilder, SoundProfileId};

/// Benchmark two-second noise generation at common device rates
fn bench_noise_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_buffer");

    for sample_rate in [44100u32, 48000, 96000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(sample_rate),
            &sample_rate,
            |b, &sample_rate| b.iter(|| black_box(NoiseBuffer::generate(2.0, sample_rate))),
        );
    }

    group.finish();
}

/// Benchmark a full build + dispose cycle per profile
fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    let config = EngineConfig::default();
    let destination = Destination::new();
    let mut builder = SignalGraphBuilder::new(&config);

    for profile in SoundProfileId::ALL {
        group.bench_function(profile.as_str(), |b| {
            b.iter(|| {
                let graph = builder
                    .build(black_box(profile), 0.5, 44100, &destination)
                    .unwrap();
                graph.dispose();
            })
        });
    }

    group.finish();
}

/// Benchmark rendering one device block through a rain graph
fn bench_render_block(c: &mut Criterion) {
    let config = EngineConfig::default();
    let destination = Destination::new();
    let mut builder = SignalGraphBuilder::new(&config);
    let _graph = builder
        .build(SoundProfileId::Rain, 0.5, 44100, &destination)
        .unwrap();

    let mut out = vec![0.0f32; 512];
    c.bench_function("render_block_512", |b| {
        b.iter(|| {
            destination.render(black_box(&mut out));
        })
    });
}

criterion_group!(
    benches,
    bench_noise_generation,
    bench_graph_build,
    bench_render_block
);
criterion_main!(benches);
