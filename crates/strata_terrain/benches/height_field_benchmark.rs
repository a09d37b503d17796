//! Benchmark for contour height-field synthesis.
//!
//! TARGET: a 128x128 column field from a three-layer stack in under 2ms
//!
//! Run with: cargo bench --package strata_terrain --bench height_field_benchmark

use std::f32::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_shared::PlanarPoint;
use strata_terrain::{compute_height_field, BufferConfig, HeightFieldRequest, Layer, LayerStack};

/// Irregular closed outline: a circle with a lobed radius.
fn outline(radius: f32, vertices: usize) -> Vec<PlanarPoint> {
    (0..vertices)
        .map(|i| {
            let a = i as f32 / vertices as f32 * TAU;
            let r = radius * (1.0 + 0.15 * (3.0 * a).sin());
            PlanarPoint::new(r * a.cos(), r * a.sin())
        })
        .collect()
}

fn mountain() -> Vec<Layer> {
    vec![
        Layer::new(0.0, 40.0, outline(200.0, 64)),
        Layer::new(0.0, 120.0, outline(120.0, 48)),
        Layer::new(0.0, 220.0, outline(40.0, 24)),
    ]
}

fn request(layers: &[Layer], columns: usize) -> HeightFieldRequest<'_> {
    let half = columns as f32 * 2.0;
    HeightFieldRequest {
        layers,
        ground_y: 0.0,
        feather: 24.0,
        x_range: 0..columns,
        z_range: 0..columns,
        origin: PlanarPoint::new(-half, -half),
        angular_bins: BufferConfig::DEFAULT_ANGULAR_BINS,
        smoothing_passes: 1,
    }
}

fn benchmark_stack_build(c: &mut Criterion) {
    let layers = mountain();

    c.bench_function("layer_stack_3_layers", |b| {
        b.iter(|| {
            black_box(LayerStack::new(
                black_box(&layers),
                BufferConfig::DEFAULT_ANGULAR_BINS,
            ))
        });
    });
}

fn benchmark_surface_sample(c: &mut Criterion) {
    let layers = mountain();
    let Some(stack) = LayerStack::new(&layers, BufferConfig::DEFAULT_ANGULAR_BINS) else {
        return;
    };

    c.bench_function("surface_at_single", |b| {
        let mut t = 0.0f32;
        b.iter(|| {
            t += 0.37;
            let p = PlanarPoint::new((t % 250.0) - 125.0, (t * 0.7 % 250.0) - 125.0);
            black_box(stack.surface_at(black_box(p), 0.0, 24.0))
        });
    });
}

fn benchmark_field_sizes(c: &mut Criterion) {
    let layers = mountain();
    let mut group = c.benchmark_group("height_field");

    for columns in [32usize, 64, 128] {
        group.throughput(Throughput::Elements((columns * columns) as u64));
        group.bench_function(format!("{columns}x{columns}_columns"), |b| {
            let req = request(&layers, columns);
            b.iter(|| black_box(compute_height_field(black_box(&req))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_stack_build,
    benchmark_surface_sample,
    benchmark_field_sizes
);
criterion_main!(benches);
