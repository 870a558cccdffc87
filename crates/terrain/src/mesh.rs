use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use terrascape_common::ConfigError;
use terrascape_noise::HeightSource;

use crate::biome::Biome;
use crate::grid::{CELL_CORNERS, TerrainGrid, face_normal};

/// One emitted terrain vertex, ready for upload.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShadedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl ShadedVertex {
    /// Number of `f32`s per vertex.
    pub const FLOATS: usize = 9;
}

/// Triangle counts per biome for one shading pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiomeHistogram {
    pub snow: usize,
    pub rock: usize,
    pub grass: usize,
    pub sand: usize,
}

impl BiomeHistogram {
    fn record(&mut self, biome: Biome) {
        match biome {
            Biome::Snow => self.snow += 1,
            Biome::Rock => self.rock += 1,
            Biome::Grass => self.grass += 1,
            Biome::Sand => self.sand += 1,
        }
    }

    pub fn get(&self, biome: Biome) -> usize {
        match biome {
            Biome::Snow => self.snow,
            Biome::Rock => self.rock,
            Biome::Grass => self.grass,
            Biome::Sand => self.sand,
        }
    }

    pub fn total(&self) -> usize {
        self.snow + self.rock + self.grass + self.sand
    }
}

impl std::fmt::Display for BiomeHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "snow={} rock={} grass={} sand={}",
            self.snow, self.rock, self.grass, self.sand
        )
    }
}

/// Terrain lattice plus the per-triangle shading pass.
///
/// Heights are sampled at `vertex.xz + origin`, where `origin` is the
/// viewer's X-Z position: the noise domain scrolls under a mesh that stays
/// put in world space.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    grid: TerrainGrid,
}

impl TerrainMesh {
    pub fn new(width: f32, height: f32, subdivisions: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            grid: TerrainGrid::new(width, height, subdivisions)?,
        })
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn regenerate(
        &mut self,
        width: f32,
        height: f32,
        subdivisions: u32,
    ) -> Result<(), ConfigError> {
        self.grid.regenerate(width, height, subdivisions)
    }

    /// Height at every lattice point, row-major with `j` (Z) outermost.
    ///
    /// Shared corners are evaluated once; since evaluation is pure this is
    /// identical to sampling each emitted vertex on its own.
    pub fn lattice_heights<H: HeightSource>(&self, source: &H, origin: Vec2) -> Vec<f32> {
        let len = self.grid.lattice_len() as u32;
        let mut heights = Vec::with_capacity((len * len) as usize);
        for j in 0..len {
            for i in 0..len {
                let p = self.grid.lattice_point(i, j) + origin;
                heights.push(source.height_at(p.x, p.y));
            }
        }
        heights
    }

    /// Emit every triangle with injected heights, its face normal, and its
    /// biome colour.
    pub fn shade<H: HeightSource>(&self, source: &H, origin: Vec2) -> Vec<ShadedVertex> {
        let mut out = Vec::with_capacity(self.grid.vertex_count());
        self.shade_into(source, origin, &mut out);
        out
    }

    /// Like [`shade`](Self::shade) but reuses `out`'s allocation.
    pub fn shade_into<H: HeightSource>(
        &self,
        source: &H,
        origin: Vec2,
        out: &mut Vec<ShadedVertex>,
    ) -> BiomeHistogram {
        let _span = tracing::info_span!("terrain_shade", n = self.grid.subdivisions()).entered();

        let heights = self.lattice_heights(source, origin);
        let len = self.grid.lattice_len();
        let n = self.grid.subdivisions();
        let mut histogram = BiomeHistogram::default();

        out.clear();
        out.reserve(self.grid.vertex_count());

        for j in 0..n {
            for i in 0..n {
                for tri in CELL_CORNERS.chunks_exact(3) {
                    let corners: [Vec3; 3] = std::array::from_fn(|k| {
                        let (di, dj) = tri[k];
                        let (ci, cj) = (i + di, j + dj);
                        let p = self.grid.lattice_point(ci, cj);
                        let h = heights[cj as usize * len + ci as usize];
                        Vec3::new(p.x, h, p.y)
                    });

                    let normal = face_normal(corners).to_array();
                    let biome = Biome::for_triangle(corners.map(|c| c.y));
                    histogram.record(biome);
                    let color = biome.color().to_array();

                    for c in corners {
                        out.push(ShadedVertex {
                            position: c.to_array(),
                            normal,
                            color,
                        });
                    }
                }
            }
        }

        tracing::trace!(
            vertices = out.len(),
            %histogram,
            "terrain shaded"
        );
        histogram
    }

    /// Count triangles per biome without keeping the vertex stream.
    pub fn biome_histogram<H: HeightSource>(&self, source: &H, origin: Vec2) -> BiomeHistogram {
        let mut scratch = Vec::new();
        self.shade_into(source, origin, &mut scratch)
    }
}
