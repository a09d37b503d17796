//! # STRATA Terrain
//!
//! Buffered voxel-terrain writes: accumulate edits in a dense local grid,
//! commit them to the backing store in one batch.
//!
//! ## Design Principles
//!
//! 1. **Buffered**: every edit is an in-memory array write until `flush`
//! 2. **Forgiving**: geometry that misses the buffer is a no-op, never an error
//! 3. **Smooth**: features are rasterized with fractional occupancy
//! 4. **Deterministic**: same inputs and seed, same voxels
//!
//! ## Core Components
//!
//! - `VoxelBuffer`: the dense grid and every write operation
//! - `LayerStack` / `compute_height_field`: contour layers to a surface
//! - `RadialProfile` / `AngularBins`: polygon radius by angle
//! - `TerrainStore`: bulk read / bulk write seam to persistent terrain
//! - `RegionSnapshot`: LZ4-compressed region captures
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_terrain::{Layer, Material, MemoryTerrainStore, VoxelBuffer};
//! use strata_shared::{PlanarPoint, Vec3};
//!
//! let store = MemoryTerrainStore::new();
//! let mut buffer = VoxelBuffer::new(Vec3::splat(-64.0), Vec3::splat(64.0))?;
//!
//! let base = Layer::new(0.0, 10.0, vec![/* outline */]);
//! let peak = Layer::new(0.0, 24.0, vec![/* smaller outline */]);
//! buffer.fill_feature(&[base, peak], 0.0, Material::new(1), 6.0);
//!
//! // One bulk write, however many edits came before
//! buffer.flush(&store)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod features;
pub mod grid;
pub mod height_field;
pub mod layer;
pub mod material;
pub mod noise;
pub mod paint;
pub mod profile;
pub mod rooms;
pub mod snapshot;
pub mod store;

pub use buffer::{FlushSummary, VoxelBuffer};
pub use config::BufferConfig;
pub use error::{FlushError, TerrainError, TerrainResult};
pub use features::ColumnHeights;
pub use grid::Region;
pub use height_field::{
    compute_height_field, smoothstep, HeightField, HeightFieldRequest, LayerStack,
};
pub use layer::Layer;
pub use material::{Material, Voxel};
pub use noise::{NoiseSeed, SimplexNoise};
pub use paint::{NoiseMix, NoisePaint};
pub use profile::{AngularBins, RadialProfile};
pub use rooms::Room;
pub use snapshot::RegionSnapshot;
pub use store::{MemoryTerrainStore, RegionData, RegionView, TerrainStore};
