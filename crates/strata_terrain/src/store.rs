//! # Backing Terrain Store
//!
//! The buffer talks to persistent terrain through exactly two bulk calls:
//! read a region, write a region. Both move parallel material / occupancy
//! arrays laid out with the region's flat index `x + sx * (y + sy * z)`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use strata_shared::constants::INV_VOXEL_SIZE;
use strata_shared::Vec3;

use crate::error::{TerrainError, TerrainResult};
use crate::grid::Region;
use crate::material::{Material, Voxel};

/// Borrowed region contents handed to [`TerrainStore::write_region`].
#[derive(Clone, Copy, Debug)]
pub struct RegionView<'a> {
    /// Material per cell.
    pub materials: &'a [Material],
    /// Occupancy per cell.
    pub occupancy: &'a [f32],
}

/// Owned region contents returned by [`TerrainStore::read_region`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionData {
    /// Material per cell.
    pub materials: Vec<Material>,
    /// Occupancy per cell.
    pub occupancy: Vec<f32>,
}

impl RegionData {
    /// All-empty contents for `cells` cells.
    #[must_use]
    pub fn empty(cells: usize) -> Self {
        Self {
            materials: vec![Material::EMPTY; cells],
            occupancy: vec![0.0; cells],
        }
    }

    /// Borrows the contents as a view.
    #[must_use]
    pub fn view(&self) -> RegionView<'_> {
        RegionView {
            materials: &self.materials,
            occupancy: &self.occupancy,
        }
    }

    /// Fails unless both arrays hold exactly `expected` cells.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::RegionMismatch`] on a length mismatch.
    pub fn check_len(&self, expected: usize) -> TerrainResult<()> {
        for actual in [self.materials.len(), self.occupancy.len()] {
            if actual != expected {
                return Err(TerrainError::RegionMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

/// Persistent terrain the buffer reads from and commits to.
pub trait TerrainStore: Send + Sync {
    /// Reads the current contents of `region`.
    ///
    /// Optional: stores that are write-only keep the default.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ReadUnsupported`] by default, or a
    /// store-specific error.
    fn read_region(&self, region: &Region) -> TerrainResult<RegionData> {
        let _ = region;
        Err(TerrainError::ReadUnsupported)
    }

    /// Replaces the contents of `region` in one batched write.
    ///
    /// # Errors
    ///
    /// Returns a store-specific error if the write fails.
    fn write_region(&self, region: &Region, data: RegionView<'_>) -> TerrainResult<()>;
}

/// World cell key: `floor(center / VOXEL_SIZE)` per axis.
type CellKey = [i64; 3];

fn cell_key(world: Vec3) -> CellKey {
    [
        (world.x * INV_VOXEL_SIZE).floor() as i64,
        (world.y * INV_VOXEL_SIZE).floor() as i64,
        (world.z * INV_VOXEL_SIZE).floor() as i64,
    ]
}

/// Sparse in-memory terrain.
///
/// Only non-empty cells are kept. Counts bulk calls so callers can observe
/// batching.
#[derive(Debug, Default)]
pub struct MemoryTerrainStore {
    cells: RwLock<HashMap<CellKey, Voxel>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryTerrainStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell containing world point `world`, or [`Voxel::EMPTY`].
    #[must_use]
    pub fn voxel_at(&self, world: Vec3) -> Voxel {
        let cells = self.cells.read();
        let key = cell_key(world);
        cells.get(&key).copied().unwrap_or(Voxel::EMPTY)
    }

    /// Number of non-empty cells held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Returns true if no cell is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Bulk reads served so far.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Bulk writes served so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl TerrainStore for MemoryTerrainStore {
    fn read_region(&self, region: &Region) -> TerrainResult<RegionData> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let [sx, sy, sz] = region.dims();
        let mut data = RegionData::empty(region.cell_count());
        let cells = self.cells.read();

        for z in 0..sz {
            for y in 0..sy {
                for x in 0..sx {
                    if let Some(voxel) = cells.get(&cell_key(region.cell_center(x, y, z))) {
                        let i = region.linear_index(x, y, z);
                        data.materials[i] = voxel.material;
                        data.occupancy[i] = voxel.occupancy;
                    }
                }
            }
        }
        Ok(data)
    }

    fn write_region(&self, region: &Region, data: RegionView<'_>) -> TerrainResult<()> {
        let expected = region.cell_count();
        for actual in [data.materials.len(), data.occupancy.len()] {
            if actual != expected {
                return Err(TerrainError::RegionMismatch { expected, actual });
            }
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        let [sx, sy, sz] = region.dims();
        let mut cells = self.cells.write();

        for z in 0..sz {
            for y in 0..sy {
                for x in 0..sx {
                    let i = region.linear_index(x, y, z);
                    let key = cell_key(region.cell_center(x, y, z));
                    let voxel = Voxel::new(data.materials[i], data.occupancy[i]);
                    if voxel.is_air() && voxel.material.is_empty() {
                        cells.remove(&key);
                    } else {
                        cells.insert(key, voxel);
                    }
                }
            }
        }
        Ok(())
    }
}
