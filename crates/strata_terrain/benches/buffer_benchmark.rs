//! Benchmark for buffer edits and the bulk commit.
//!
//! TARGET: a 64^3 buffer filled, carved and flushed in under 10ms
//!
//! Run with: cargo bench --package strata_terrain --bench buffer_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_shared::{Pose, Quaternion, Vec3};
use strata_terrain::{Material, MemoryTerrainStore, NoiseMix, Room, VoxelBuffer};

const STONE: Material = Material::new(1);
const ORE: Material = Material::new(3);

/// 64 cells per side.
fn buffer() -> VoxelBuffer {
    VoxelBuffer::new(Vec3::splat(-128.0), Vec3::splat(128.0)).unwrap()
}

fn benchmark_fill_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_block");
    group.throughput(Throughput::Elements(64 * 64 * 64));

    group.bench_function("axis_aligned_full", |b| {
        let mut buf = buffer();
        let pose = Pose::at(Vec3::ZERO);
        let size = Vec3::splat(256.0);
        b.iter(|| black_box(buf.fill_block(pose, size, STONE)));
    });

    group.bench_function("rotated_full", |b| {
        let mut buf = buffer();
        let turn = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.6);
        let pose = Pose::new(Vec3::ZERO, turn);
        let size = Vec3::splat(256.0);
        b.iter(|| black_box(buf.fill_block(pose, size, STONE)));
    });

    group.finish();
}

fn benchmark_room(c: &mut Criterion) {
    let room = Room::new(Vec3::ZERO, Vec3::new(96.0, 48.0, 96.0));

    c.bench_function("room_shell_and_interior", |b| {
        let mut buf = buffer();
        b.iter(|| {
            buf.fill_shell(black_box(&room), 16.0, STONE);
            black_box(buf.carve_interior(black_box(&room)))
        });
    });
}

fn benchmark_mix_block(c: &mut Criterion) {
    let mut buf = buffer();
    buf.fill_block(Pose::at(Vec3::ZERO), Vec3::splat(256.0), STONE);

    let mut group = c.benchmark_group("mix_block");
    group.throughput(Throughput::Elements(64 * 64 * 64));
    group.sample_size(20);
    group.bench_function("3d_noise_full", |b| {
        let pose = Pose::at(Vec3::ZERO);
        let size = Vec3::splat(256.0);
        let mix = NoiseMix::default();
        b.iter(|| black_box(buf.mix_block(pose, size, ORE, mix)));
    });
    group.finish();
}

fn benchmark_flush(c: &mut Criterion) {
    let mut template = buffer();
    let lower_half = Pose::at(Vec3::new(0.0, -64.0, 0.0));
    template.fill_block(lower_half, Vec3::new(256.0, 128.0, 256.0), STONE);

    let mut group = c.benchmark_group("flush");
    group.sample_size(10);
    group.bench_function("half_solid_64_cubed", |b| {
        b.iter(|| {
            let store = MemoryTerrainStore::new();
            let flushed = template.clone().flush(&store);
            black_box(flushed.map(|summary| summary.solid_cells))
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_fill_block,
    benchmark_room,
    benchmark_mix_block,
    benchmark_flush
);
criterion_main!(benches);
