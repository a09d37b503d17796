//! # Region Snapshots
//!
//! A region's materials and occupancy captured as one LZ4-compressed blob.
//!
//! ## Format
//!
//! Before compression the blob is:
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 32 | [`SnapshotHeader`] |
//! | 2 per cell | materials (`u16`, native endian) |
//! | 4 per cell | occupancy (`f32`, native endian) |
//!
//! and is then compressed with `lz4_flex::compress_prepend_size`. Terrain is
//! mostly long runs of one material, so ratios of 10:1 are common.

use std::io::{Read, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use strata_shared::{Vec3, VOXEL_SIZE};

use crate::error::{TerrainError, TerrainResult};
use crate::grid::Region;
use crate::material::{clamp_occupancy, Material};
use crate::store::RegionData;

/// File magic.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"STRA";

/// Fixed-size header at the start of every decompressed snapshot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SnapshotHeader {
    /// Always [`SNAPSHOT_MAGIC`].
    pub magic: [u8; 4],
    /// Voxel edge length the region was captured at.
    pub voxel_size: f32,
    /// Snapped lower corner.
    pub min: [f32; 3],
    /// Cell counts along x, y, z.
    pub dims: [u32; 3],
}

const HEADER_LEN: usize = std::mem::size_of::<SnapshotHeader>();
const MATERIAL_LEN: usize = std::mem::size_of::<Material>();
const OCCUPANCY_LEN: usize = std::mem::size_of::<f32>();

/// Captured contents of a region.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionSnapshot {
    region: Region,
    data: RegionData,
}

impl RegionSnapshot {
    /// Wraps `data` captured over `region`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::RegionMismatch`] if the arrays do not cover
    /// the region exactly.
    pub fn new(region: Region, data: RegionData) -> TerrainResult<Self> {
        data.check_len(region.cell_count())?;
        Ok(Self { region, data })
    }

    /// Wraps arrays already known to cover `region`.
    pub(crate) fn capture(region: Region, data: RegionData) -> Self {
        debug_assert_eq!(data.materials.len(), region.cell_count());
        Self { region, data }
    }

    /// Region the snapshot covers.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Captured cell contents.
    #[must_use]
    pub fn data(&self) -> &RegionData {
        &self.data
    }

    /// Splits into region and contents.
    #[must_use]
    pub fn into_parts(self) -> (Region, RegionData) {
        (self.region, self.data)
    }

    /// Encodes and compresses the snapshot.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let [sx, sy, sz] = self.region.dims();
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            voxel_size: self.region.voxel_size(),
            min: self.region.min().to_array(),
            dims: [sx as u32, sy as u32, sz as u32],
        };

        let cells = self.data.materials.len();
        let mut raw = Vec::with_capacity(HEADER_LEN + cells * (MATERIAL_LEN + OCCUPANCY_LEN));
        raw.extend_from_slice(bytemuck::bytes_of(&header));
        raw.extend_from_slice(bytemuck::cast_slice(&self.data.materials));
        raw.extend_from_slice(bytemuck::cast_slice(&self.data.occupancy));

        compress_prepend_size(&raw)
    }

    /// Decompresses and validates a blob produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::CorruptSnapshot`] if the blob does not
    /// decompress, has the wrong magic or voxel size, or its body length
    /// does not match the header.
    pub fn decode(bytes: &[u8]) -> TerrainResult<Self> {
        let Ok(raw) = decompress_size_prepended(bytes) else {
            return Err(TerrainError::CorruptSnapshot("lz4 decompression failed"));
        };
        if raw.len() < HEADER_LEN {
            return Err(TerrainError::CorruptSnapshot("truncated header"));
        }
        let header: SnapshotHeader = bytemuck::pod_read_unaligned(&raw[..HEADER_LEN]);
        if header.magic != SNAPSHOT_MAGIC {
            return Err(TerrainError::CorruptSnapshot("bad magic"));
        }
        if header.voxel_size != VOXEL_SIZE {
            return Err(TerrainError::CorruptSnapshot("voxel size mismatch"));
        }

        let [sx, sy, sz] = header.dims.map(|d| d as usize);
        let min = Vec3::from_array(header.min);
        let max = min + Vec3::new(sx as f32, sy as f32, sz as f32) * VOXEL_SIZE;
        let region = Region::snapped(min, max)
            .map_err(|_| TerrainError::CorruptSnapshot("empty region"))?;
        if region.dims() != [sx, sy, sz] {
            return Err(TerrainError::CorruptSnapshot("header bounds off grid"));
        }

        let (cells, body_len) = sx
            .checked_mul(sy)
            .and_then(|n| n.checked_mul(sz))
            .and_then(|n| Some((n, n.checked_mul(MATERIAL_LEN + OCCUPANCY_LEN)?)))
            .ok_or(TerrainError::CorruptSnapshot("header dims overflow"))?;

        let body = &raw[HEADER_LEN..];
        if body.len() != body_len {
            return Err(TerrainError::CorruptSnapshot("body length mismatch"));
        }
        let (material_bytes, occupancy_bytes) = body.split_at(cells * MATERIAL_LEN);

        let materials = material_bytes
            .chunks_exact(MATERIAL_LEN)
            .map(bytemuck::pod_read_unaligned::<Material>)
            .collect();
        let occupancy = occupancy_bytes
            .chunks_exact(OCCUPANCY_LEN)
            .map(|b| clamp_occupancy(bytemuck::pod_read_unaligned::<f32>(b)))
            .collect();

        Ok(Self {
            region,
            data: RegionData {
                materials,
                occupancy,
            },
        })
    }

    /// Saves the snapshot to a compressed binary file, returning the file
    /// size in bytes.
    ///
    /// # Errors
    ///
    /// Returns error if file operations fail.
    pub fn save_compressed(&self, path: &Path) -> TerrainResult<usize> {
        let compressed = self.encode();
        let mut file = std::fs::File::create(path)?;
        file.write_all(&compressed)?;
        Ok(compressed.len())
    }

    /// Loads a snapshot from a compressed binary file.
    ///
    /// # Errors
    ///
    /// Returns error if file operations, decompression or validation fail.
    pub fn load_compressed(path: &Path) -> TerrainResult<Self> {
        let mut file = std::fs::File::open(path)?;
        let mut compressed = Vec::new();
        file.read_to_end(&mut compressed)?;
        Self::decode(&compressed)
    }
}
