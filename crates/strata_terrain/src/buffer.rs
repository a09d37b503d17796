//! # Voxel Buffer
//!
//! A private scratch grid: two parallel dense arrays (material, occupancy)
//! over a snapped world box. Every edit is an in-memory array write; the
//! whole buffer reaches the backing store in one [`VoxelBuffer::flush`].
//!
//! ## Layout
//!
//! Cell `(x, y, z)` lives at `x + sx * (y + sy * z)`.
//!
//! ## Bounds Discipline
//!
//! Every operation first converts its world-space footprint to index ranges.
//! Footprints that miss the buffer are no-ops: operations return the number
//! of cells they touched, which is simply 0.

use std::fmt;

use strata_shared::{Pose, Vec3, VOXEL_SIZE};
use tracing::{info, warn};

use crate::config::BufferConfig;
use crate::error::{FlushError, TerrainError, TerrainResult};
use crate::grid::{cell_bottom, Region};
use crate::material::{clamp_occupancy, Material, Voxel};
use crate::noise::{NoiseSeed, SimplexNoise};
use crate::snapshot::RegionSnapshot;
use crate::store::{RegionData, RegionView, TerrainStore};

/// Slack, in world units, when testing a cell center against a rotated box.
const ORIENTED_TOLERANCE: f32 = 1e-3;

/// What a [`VoxelBuffer::flush`] committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlushSummary {
    /// Region written.
    pub region: Region,
    /// Cells written.
    pub cells: usize,
    /// Cells with non-zero occupancy.
    pub solid_cells: usize,
}

/// Dense, buffered voxel grid.
#[derive(Clone)]
pub struct VoxelBuffer {
    pub(crate) region: Region,
    pub(crate) materials: Vec<Material>,
    pub(crate) occupancy: Vec<f32>,
    pub(crate) config: BufferConfig,
    pub(crate) noise: SimplexNoise,
}

impl fmt::Debug for VoxelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelBuffer")
            .field("region", &self.region)
            .field("solid_cells", &self.solid_cell_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VoxelBuffer {
    /// Empty buffer over `[world_min, world_max]`, snapped outward.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidBounds`] for empty or inverted bounds
    /// and [`TerrainError::TooManyCells`] past the default cell budget.
    pub fn new(world_min: Vec3, world_max: Vec3) -> TerrainResult<Self> {
        Self::with_config(world_min, world_max, BufferConfig::default())
    }

    /// Empty buffer with an explicit configuration.
    ///
    /// # Errors
    ///
    /// As [`Self::new`], plus [`TerrainError::InvalidConfig`].
    pub fn with_config(
        world_min: Vec3,
        world_max: Vec3,
        config: BufferConfig,
    ) -> TerrainResult<Self> {
        let region = Region::snapped(world_min, world_max)?;
        Self::allocate(region, config)
    }

    fn allocate(region: Region, config: BufferConfig) -> TerrainResult<Self> {
        config.validate()?;
        let cells = region.cell_count();
        if cells > config.max_cells {
            return Err(TerrainError::TooManyCells {
                cells,
                limit: config.max_cells,
            });
        }
        let noise = SimplexNoise::new(NoiseSeed::new(config.noise_seed));
        Ok(Self {
            region,
            materials: vec![Material::EMPTY; cells],
            occupancy: vec![0.0; cells],
            config,
            noise,
        })
    }

    /// Buffer pre-populated with the store's current contents of the region.
    ///
    /// # Errors
    ///
    /// As [`Self::new`], plus any read error of the store and
    /// [`TerrainError::RegionMismatch`] if it returns the wrong amount of
    /// data.
    pub fn from_existing_terrain<S>(
        store: &S,
        world_min: Vec3,
        world_max: Vec3,
    ) -> TerrainResult<Self>
    where
        S: TerrainStore + ?Sized,
    {
        let config = BufferConfig::default();
        Self::from_existing_terrain_with_config(store, world_min, world_max, config)
    }

    /// [`Self::from_existing_terrain`] with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`Self::from_existing_terrain`].
    pub fn from_existing_terrain_with_config<S>(
        store: &S,
        world_min: Vec3,
        world_max: Vec3,
        config: BufferConfig,
    ) -> TerrainResult<Self>
    where
        S: TerrainStore + ?Sized,
    {
        let mut buffer = Self::with_config(world_min, world_max, config)?;
        let data = store.read_region(&buffer.region)?;
        buffer.load(data)?;
        info!(
            cells = buffer.region.cell_count(),
            solid = buffer.solid_cell_count(),
            min = ?buffer.region.min(),
            max = ?buffer.region.max(),
            "loaded voxel buffer from store"
        );
        Ok(buffer)
    }

    /// Buffer holding a snapshot's contents.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::TooManyCells`] past the default cell budget.
    pub fn from_snapshot(snapshot: RegionSnapshot) -> TerrainResult<Self> {
        let (region, data) = snapshot.into_parts();
        let mut buffer = Self::allocate(region, BufferConfig::default())?;
        buffer.load(data)?;
        Ok(buffer)
    }

    fn load(&mut self, data: RegionData) -> TerrainResult<()> {
        data.check_len(self.region.cell_count())?;
        self.materials = data.materials;
        self.occupancy = data.occupancy;
        for occupancy in &mut self.occupancy {
            *occupancy = clamp_occupancy(*occupancy);
        }
        Ok(())
    }

    /// Captures the current contents.
    #[must_use]
    pub fn snapshot(&self) -> RegionSnapshot {
        RegionSnapshot::capture(
            self.region,
            RegionData {
                materials: self.materials.clone(),
                occupancy: self.occupancy.clone(),
            },
        )
    }

    /// Commits the whole buffer with one bulk write and consumes it.
    ///
    /// # Errors
    ///
    /// Returns a [`FlushError`] holding the store's error and the unchanged
    /// buffer.
    pub fn flush<S>(self, store: &S) -> Result<FlushSummary, FlushError>
    where
        S: TerrainStore + ?Sized,
    {
        let view = RegionView {
            materials: &self.materials,
            occupancy: &self.occupancy,
        };
        if let Err(e) = store.write_region(&self.region, view) {
            warn!(
                error = %e,
                cells = self.region.cell_count(),
                "flush rejected by store"
            );
            return Err(FlushError::new(e, self));
        }

        let summary = FlushSummary {
            region: self.region,
            cells: self.region.cell_count(),
            solid_cells: self.solid_cell_count(),
        };
        info!(
            cells = summary.cells,
            solid = summary.solid_cells,
            min = ?self.region.min(),
            max = ?self.region.max(),
            voxel_size = VOXEL_SIZE,
            "flushed voxel buffer"
        );
        Ok(summary)
    }

    /// Snapped region the buffer covers.
    #[inline]
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Cell counts along x, y, z.
    #[inline]
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.region.dims()
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Material of every cell, flat.
    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Occupancy of every cell, flat.
    #[must_use]
    pub fn occupancy(&self) -> &[f32] {
        &self.occupancy
    }

    /// Cell at index `(x, y, z)`, or `None` out of range.
    #[must_use]
    pub fn get_voxel(&self, x: usize, y: usize, z: usize) -> Option<Voxel> {
        if !self.region.contains(x, y, z) {
            return None;
        }
        let i = self.region.linear_index(x, y, z);
        Some(Voxel {
            material: self.materials[i],
            occupancy: self.occupancy[i],
        })
    }

    /// Writes one cell. Out-of-range writes are dropped and return false.
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) -> bool {
        if !self.region.contains(x, y, z) {
            return false;
        }
        let i = self.region.linear_index(x, y, z);
        self.materials[i] = voxel.material;
        self.occupancy[i] = clamp_occupancy(voxel.occupancy);
        true
    }

    /// Cell containing world point `world`.
    #[must_use]
    pub fn cell_at(&self, world: Vec3) -> Option<Voxel> {
        let [x, y, z] = self.region.cell_of(world)?;
        self.get_voxel(x, y, z)
    }

    /// Number of cells with non-zero occupancy.
    #[must_use]
    pub fn solid_cell_count(&self) -> usize {
        self.occupancy.iter().filter(|&&o| o > 0.0).count()
    }

    /// Surface elevation of column `(x, z)`: top of its highest solid cell,
    /// counting fractional occupancy, or `ground_y` if the column is empty.
    #[must_use]
    pub fn column_height(&self, x: usize, z: usize, ground_y: f32) -> Option<f32> {
        let [sx, sy, sz] = self.region.dims();
        if x >= sx || z >= sz {
            return None;
        }
        let top = (0..sy).rev().find_map(|y| {
            let o = self.occupancy[self.region.linear_index(x, y, z)];
            (o > 0.0).then(|| cell_bottom(y, self.region.min().y) + o * VOXEL_SIZE)
        });
        Some(top.unwrap_or(ground_y))
    }

    /// Fills a box with `material` at full occupancy.
    pub fn fill_block(&mut self, pose: Pose, size: Vec3, material: Material) -> usize {
        self.fill_block_with(pose, size, material, 1.0)
    }

    /// Fills a box with `material` at the given occupancy.
    pub fn fill_block_with(
        &mut self,
        pose: Pose,
        size: Vec3,
        material: Material,
        occupancy: f32,
    ) -> usize {
        let occupancy = clamp_occupancy(occupancy);
        let Self {
            region,
            materials,
            occupancy: occ,
            ..
        } = self;
        visit_box(region, pose, size, |i, _| {
            materials[i] = material;
            occ[i] = occupancy;
            true
        })
    }

    /// Clears a box to empty.
    pub fn carve_block(&mut self, pose: Pose, size: Vec3) -> usize {
        let Self {
            region,
            materials,
            occupancy,
            ..
        } = self;
        visit_box(region, pose, size, |i, _| {
            materials[i] = Material::EMPTY;
            occupancy[i] = 0.0;
            true
        })
    }

    /// Fills only the cells of a box that are currently at occupancy 0.
    ///
    /// Used to pour liquid into carved space without replacing walls.
    pub fn fill_block_if_air(&mut self, pose: Pose, size: Vec3, material: Material) -> usize {
        let Self {
            region,
            materials,
            occupancy,
            ..
        } = self;
        visit_box(region, pose, size, |i, _| {
            if occupancy[i] > 0.0 {
                return false;
            }
            materials[i] = material;
            occupancy[i] = 1.0;
            true
        })
    }
}

/// Calls `visit(index, cell_center)` for every cell whose center lies in the
/// posed box, returning how many calls returned true.
///
/// Axis-aligned poses map straight to index ranges; rotated poses scan the
/// enclosing axis-aligned box and test each center in the box frame.
pub(crate) fn visit_box<F>(region: &Region, pose: Pose, size: Vec3, mut visit: F) -> usize
where
    F: FnMut(usize, Vec3) -> bool,
{
    let half = size.abs() * 0.5;
    if !half.is_finite() || !pose.position.is_finite() {
        return 0;
    }
    let aligned = pose.is_axis_aligned();
    let reach = if aligned { half } else { pose.enclosing_half_extents(half) };
    let Some([xs, ys, zs]) = region.ranges_for_box(pose.position - reach, pose.position + reach)
    else {
        return 0;
    };

    let limit = half + Vec3::splat(ORIENTED_TOLERANCE);
    let mut touched = 0;
    for z in zs {
        for y in ys.clone() {
            for x in xs.clone() {
                let center = region.cell_center(x, y, z);
                if !aligned {
                    let local = pose.to_local(center).abs();
                    if local.x > limit.x || local.y > limit.y || local.z > limit.z {
                        continue;
                    }
                }
                if visit(region.linear_index(x, y, z), center) {
                    touched += 1;
                }
            }
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use strata_shared::Quaternion;

    use super::*;
    use crate::store::MemoryTerrainStore;

    const STONE: Material = Material::new(1);
    const WATER: Material = Material::new(2);

    fn buffer() -> VoxelBuffer {
        VoxelBuffer::new(Vec3::ZERO, Vec3::splat(40.0)).unwrap()
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buf = buffer();
        assert_eq!(buf.dims(), [10, 10, 10]);
        assert!(buf.materials().iter().all(|m| m.is_empty()));
        assert!(buf.occupancy().iter().all(|&o| o == 0.0));
        assert_eq!(buf.solid_cell_count(), 0);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = VoxelBuffer::new(Vec3::splat(10.0), Vec3::ZERO).err();
        assert!(
            matches!(err, Some(TerrainError::InvalidBounds { .. })),
            "got {err:?}"
        );
    }

    #[test]
    fn test_rejects_oversized_buffer() {
        let config = BufferConfig {
            max_cells: 100,
            ..BufferConfig::default()
        };
        let result = VoxelBuffer::with_config(Vec3::ZERO, Vec3::splat(40.0), config);
        let Err(TerrainError::TooManyCells { cells, limit }) = result else {
            panic!("oversized buffer accepted: {result:?}");
        };
        assert_eq!((cells, limit), (1000, 100));
    }

    #[test]
    fn test_fill_block_selects_cell_centers() {
        let mut buf = buffer();
        let touched = buf.fill_block(Pose::at(Vec3::splat(20.0)), Vec3::splat(8.0), STONE);
        assert_eq!(touched, 8);
        for x in 4..6 {
            for y in 4..6 {
                for z in 4..6 {
                    assert_eq!(buf.get_voxel(x, y, z), Some(Voxel::solid(STONE)));
                }
            }
        }
        assert_eq!(buf.solid_cell_count(), 8);
    }

    #[test]
    fn test_fill_then_carve_restores_empty() {
        let mut buf = buffer();
        let pose = Pose::at(Vec3::new(10.0, 14.0, 30.0));
        let size = Vec3::new(12.0, 20.0, 9.0);
        let filled = buf.fill_block(pose, size, STONE);
        let carved = buf.carve_block(pose, size);
        assert_eq!(filled, carved);
        assert_eq!(buf.solid_cell_count(), 0);
        assert!(buf.materials().iter().all(|m| m.is_empty()));
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut buf = buffer();
        let size = Vec3::splat(8.0);
        assert_eq!(buf.fill_block(Pose::at(Vec3::splat(100.0)), size, STONE), 0);
        let nan = Pose::at(Vec3::splat(f32::NAN));
        assert_eq!(buf.fill_block(nan, size, STONE), 0);
        assert!(!buf.set_voxel(10, 0, 0, Voxel::solid(STONE)));
        assert_eq!(buf.get_voxel(0, 10, 0), None);
        assert_eq!(buf.solid_cell_count(), 0);

        // Straddling the max corner: only 2 cells per axis are inside
        let touched = buf.fill_block(Pose::at(Vec3::splat(40.0)), Vec3::splat(16.0), STONE);
        assert_eq!(touched, 8);
    }

    #[test]
    fn test_fill_if_air_keeps_solids() {
        let mut buf = buffer();
        buf.set_voxel(5, 0, 5, Voxel::new(STONE, 0.5));
        let pose = Pose::at(Vec3::new(22.0, 2.0, 22.0));
        let touched = buf.fill_block_if_air(pose, Vec3::splat(4.0), WATER);
        assert_eq!(touched, 0);
        assert_eq!(buf.get_voxel(5, 0, 5), Some(Voxel::new(STONE, 0.5)));

        let touched = buf.fill_block_if_air(pose, Vec3::new(12.0, 4.0, 4.0), WATER);
        assert_eq!(touched, 2);
        assert_eq!(buf.get_voxel(4, 0, 5), Some(Voxel::solid(WATER)));
    }

    #[test]
    fn test_occupancy_is_clamped_on_write() {
        let mut buf = buffer();
        buf.fill_block_with(Pose::at(Vec3::splat(6.0)), Vec3::splat(4.0), STONE, 3.0);
        let negative = Voxel {
            material: STONE,
            occupancy: -1.0,
        };
        buf.set_voxel(0, 0, 0, negative);
        assert!(buf.occupancy().iter().all(|o| (0.0..=1.0).contains(o)));
        assert_eq!(buf.cell_at(Vec3::splat(6.0)), Some(Voxel::solid(STONE)));
    }

    #[test]
    fn test_rotated_box_selects_inside_centers() {
        let mut buf = buffer();
        let up = Vec3::new(0.0, 1.0, 0.0);
        let quarter = Quaternion::from_axis_angle(up, std::f32::consts::FRAC_PI_2);
        let pose = Pose::new(Vec3::splat(20.0), quarter);
        // A quarter turn swaps the x and z extents of a 16 x 4 x 8 box
        let touched = buf.fill_block(pose, Vec3::new(16.0, 4.0, 8.0), STONE);
        assert_eq!(touched, 2 * 2 * 4);
        assert!(buf.get_voxel(4, 5, 3).is_some_and(|v| !v.is_air()));
        assert!(buf.get_voxel(3, 5, 4).is_some_and(Voxel::is_air));
    }

    #[test]
    fn test_column_height_reads_fractional_top() {
        let mut buf = buffer();
        buf.set_voxel(2, 0, 2, Voxel::solid(STONE));
        buf.set_voxel(2, 1, 2, Voxel::new(STONE, 0.25));
        assert_eq!(buf.column_height(2, 2, -1.0), Some(5.0));
        assert_eq!(buf.column_height(3, 3, -1.0), Some(-1.0));
        assert_eq!(buf.column_height(10, 0, 0.0), None);
    }

    #[test]
    fn test_flush_writes_once() {
        let store = MemoryTerrainStore::new();
        let mut buf = buffer();
        for i in 0..5 {
            let x = 2.0 + 4.0 * i as f32;
            buf.fill_block(Pose::at(Vec3::new(x, 2.0, 2.0)), Vec3::splat(4.0), STONE);
        }
        buf.carve_block(Pose::at(Vec3::splat(2.0)), Vec3::splat(4.0));
        let summary = buf.flush(&store).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(summary.cells, 1000);
        assert_eq!(summary.solid_cells, 4);
        let cell = store.voxel_at(Vec3::new(6.0, 2.0, 2.0));
        assert_eq!(cell, Voxel::solid(STONE));
    }

    struct Offline;

    impl TerrainStore for Offline {
        fn write_region(&self, _region: &Region, _data: RegionView<'_>) -> TerrainResult<()> {
            Err(TerrainError::Store("backend offline".into()))
        }
    }

    #[test]
    fn test_failed_flush_returns_buffer() {
        let mut buf = buffer();
        let pose = Pose::at(Vec3::new(20.0, 6.0, 20.0));
        buf.fill_block(pose, Vec3::new(8.0, 4.0, 8.0), STONE);
        let before = buf.clone();

        let err = buf.flush(&Offline).unwrap_err();
        let TerrainError::Store(msg) = err.error() else {
            panic!("unexpected flush error: {err}");
        };
        assert_eq!(msg, "backend offline");
        let buf = err.into_buffer();
        assert_eq!(buf.materials(), before.materials());
        assert_eq!(buf.occupancy(), before.occupancy());

        let store = MemoryTerrainStore::new();
        let summary = buf.flush(&store).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(summary.solid_cells, 4);
        let cell = store.voxel_at(Vec3::new(18.0, 6.0, 18.0));
        assert_eq!(cell, Voxel::solid(STONE));
    }

    #[test]
    fn test_failed_flush_converts_to_terrain_error() {
        fn commit(buf: VoxelBuffer) -> TerrainResult<FlushSummary> {
            Ok(buf.flush(&Offline)?)
        }
        let err = commit(buffer()).unwrap_err();
        assert!(matches!(err, TerrainError::Store(_)), "got {err:?}");
    }

    #[test]
    fn test_existing_terrain_round_trip() {
        let store = MemoryTerrainStore::new();
        let mut buf = buffer();
        let pose = Pose::at(Vec3::new(20.0, 6.0, 20.0));
        buf.fill_block(pose, Vec3::new(40.0, 4.0, 40.0), STONE);
        buf.flush(&store).unwrap();

        let max = Vec3::splat(40.0);
        let reopened = VoxelBuffer::from_existing_terrain(&store, Vec3::ZERO, max).unwrap();
        assert_eq!(store.read_count(), 1);
        assert_eq!(reopened.solid_cell_count(), 100);
        assert_eq!(reopened.get_voxel(7, 1, 3), Some(Voxel::solid(STONE)));
    }

    #[test]
    fn test_snapshot_restores_buffer() {
        let mut buf = buffer();
        buf.fill_block_with(Pose::at(Vec3::splat(10.0)), Vec3::splat(8.0), STONE, 0.5);
        let restored = VoxelBuffer::from_snapshot(buf.snapshot()).unwrap();
        assert_eq!(restored.region(), buf.region());
        assert_eq!(restored.materials(), buf.materials());
        assert_eq!(restored.occupancy(), buf.occupancy());
    }
}
