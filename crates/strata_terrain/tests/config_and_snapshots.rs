//! # Configuration and Snapshot Tests
//!
//! TOML configuration driving buffer behaviour, and region snapshots
//! surviving a trip through a compressed file.

use strata_shared::{Pose, Vec3};
use strata_terrain::{
    BufferConfig, Material, NoiseMix, RegionSnapshot, TerrainError, Voxel, VoxelBuffer,
};

const STONE: Material = Material::new(1);
const ORE: Material = Material::new(3);

fn solid(config: BufferConfig) -> VoxelBuffer {
    let mut buf = VoxelBuffer::with_config(Vec3::ZERO, Vec3::splat(40.0), config).unwrap();
    buf.fill_block(Pose::at(Vec3::splat(20.0)), Vec3::splat(40.0), STONE);
    buf
}

/// Test: The configured doorway margin grows every doorway carve.
#[test]
fn test_doorway_margin_from_toml() {
    let tight = BufferConfig::from_toml_str("doorway_margin = 0.0").unwrap();
    let wide = BufferConfig::from_toml_str("doorway_margin = 4.0").unwrap();

    let mut a = solid(tight);
    a.carve_doorway(Pose::at(Vec3::splat(20.0)), Vec3::splat(4.0));
    assert_eq!(a.solid_cell_count(), 1000 - 8);

    // 4 + 2 * 4 = 12 units: centers 14, 18, 22, 26 on each axis
    let mut b = solid(wide);
    b.carve_doorway(Pose::at(Vec3::splat(20.0)), Vec3::splat(4.0));
    assert_eq!(b.solid_cell_count(), 1000 - 64);
}

/// Test: The cell budget rejects oversized buffers before allocating.
#[test]
fn test_cell_budget() {
    let config = BufferConfig::from_toml_str("max_cells = 999").unwrap();
    let err = VoxelBuffer::with_config(Vec3::ZERO, Vec3::splat(40.0), config).unwrap_err();
    let TerrainError::TooManyCells { cells, limit } = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!((cells, limit), (1000, 999));

    let config = BufferConfig::from_toml_str("max_cells = 1000").unwrap();
    let fits = VoxelBuffer::with_config(Vec3::ZERO, Vec3::splat(40.0), config);
    assert!(fits.is_ok());
}

/// Test: Noise painting is a pure function of the configured seed.
#[test]
fn test_seed_determinism() {
    let paint = |seed: u64| {
        let config = BufferConfig {
            noise_seed: seed,
            ..BufferConfig::default()
        };
        let mix = NoiseMix {
            scale: 8.0,
            threshold: 0.5,
        };
        let mut buf = solid(config);
        buf.mix_block(Pose::at(Vec3::splat(20.0)), Vec3::splat(40.0), ORE, mix);
        buf.materials().to_vec()
    };

    assert_eq!(paint(7), paint(7), "same seed must paint the same cells");
    assert_ne!(
        paint(7),
        paint(8),
        "different seeds should not paint identically"
    );
}

/// Test: A buffer snapshot saved to disk reloads into an identical buffer.
#[test]
fn test_snapshot_file_round_trip() {
    let min = Vec3::new(-16.0, 0.0, -16.0);
    let mut buf = VoxelBuffer::new(min, Vec3::new(16.0, 24.0, 16.0)).unwrap();
    let ore = Vec3::new(2.0, 14.0, 2.0);
    let slab = Pose::at(Vec3::new(0.0, 4.0, 0.0));
    buf.fill_block(slab, Vec3::new(32.0, 8.0, 32.0), STONE);
    buf.fill_block_with(Pose::at(ore), Vec3::splat(4.0), ORE, 0.375);

    let path = std::env::temp_dir().join("strata_snapshot_round_trip.lz4");
    let written = buf.snapshot().save_compressed(&path).unwrap();
    assert!(written > 0);

    let snapshot = RegionSnapshot::load_compressed(&path).unwrap();
    std::fs::remove_file(&path).ok();
    let loaded = VoxelBuffer::from_snapshot(snapshot).unwrap();

    assert_eq!(loaded.region(), buf.region());
    assert_eq!(loaded.materials(), buf.materials());
    assert_eq!(loaded.occupancy(), buf.occupancy());
    assert_eq!(loaded.cell_at(ore), Some(Voxel::new(ORE, 0.375)));
}

/// Test: A truncated snapshot file is reported as corrupt, not panicked on.
#[test]
fn test_truncated_snapshot_file() {
    let buf = VoxelBuffer::new(Vec3::ZERO, Vec3::splat(16.0)).unwrap();
    let bytes = buf.snapshot().encode();

    let path = std::env::temp_dir().join("strata_snapshot_truncated.lz4");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let result = RegionSnapshot::load_compressed(&path);
    std::fs::remove_file(&path).ok();

    let Err(err) = result else {
        panic!("truncated file loaded");
    };
    assert!(
        matches!(err, TerrainError::CorruptSnapshot(_)),
        "got {err:?}"
    );
}
