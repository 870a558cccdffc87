//! Terrain mesh: a fixed X-Z lattice of triangles whose heights come from a
//! [`HeightSource`](terrascape_noise::HeightSource) sampled relative to a
//! moving origin.
//!
//! # Invariants
//! - `subdivisions = N` yields exactly `2·N²` triangles and `6·N²` vertices.
//! - Grid geometry is immutable once built; heights are never stored in it.
//! - All three vertices of a triangle share one normal and one biome colour.

mod biome;
mod grid;
pub mod lighting;
mod mesh;

pub use biome::Biome;
pub use grid::{MAX_SUBDIVISIONS, TerrainGrid, face_normal};
pub use mesh::{BiomeHistogram, ShadedVertex, TerrainMesh};
