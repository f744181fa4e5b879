//! 星系生成基准测试
//!
//! 覆盖纯生成、GPU 顶点打包和完整的替换流程

use std::hint::black_box;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use galaxy_generator::config::GenerationConfig;
use galaxy_generator::galaxy::{generate_with_rng, generate_seeded, GalaxyGenerator, GalaxyParameters};
use galaxy_generator::render::HeadlessBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;

const COUNTS: [u32; 3] = [1_000, 10_000, 100_000];

fn params(count: u32) -> GalaxyParameters {
    GalaxyParameters {
        particle_count: count,
        ..GalaxyParameters::default()
    }
}

// ============================================================================
// 生成
// ============================================================================

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("galaxy_generate");

    for count in COUNTS {
        let params = params(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &params, |b, params| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| black_box(generate_with_rng(params, &mut rng)))
        });
    }

    group.finish();
}

// ============================================================================
// 顶点打包
// ============================================================================

fn bench_to_vertices(c: &mut Criterion) {
    let mut group = c.benchmark_group("galaxy_to_vertices");

    for count in COUNTS {
        let Ok(field) = generate_seeded(&params(count), 7) else {
            continue;
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &field, |b, field| {
            b.iter(|| black_box(field.to_vertices()))
        });
    }

    group.finish();
}

// ============================================================================
// 完整替换流程
// ============================================================================

fn bench_regenerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("galaxy_regenerate");
    group.sample_size(20);

    let config = GenerationConfig {
        seed: Some(1),
        ..GenerationConfig::default()
    };
    let Ok(mut generator) =
        GalaxyGenerator::new(GalaxyParameters::default(), config, HeadlessBackend::new())
    else {
        return;
    };

    for count in COUNTS {
        let params = params(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &params, |b, params| {
            b.iter(|| black_box(generator.regenerate(params.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_to_vertices, bench_regenerate);
criterion_main!(benches);
