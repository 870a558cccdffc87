use glam::{Vec2, Vec3};
use terrascape_common::{ConfigError, ensure_positive};

/// Upper bound on subdivisions per axis (6·N² vertices must stay addressable).
pub const MAX_SUBDIVISIONS: u32 = 4096;

/// Lattice offsets of the six vertices emitted per cell, two triangles:
/// `{(x,z),(x,z+sz),(x+sx,z)}` and `{(x+sx,z),(x,z+sz),(x+sx,z+sz)}`.
///
/// Both triangles wind counter-clockwise seen from +Y, so their face normals
/// point up and back-face culling keeps the top side.
pub(crate) const CELL_CORNERS: [(u32, u32); 6] = [(0, 0), (0, 1), (1, 0), (1, 0), (0, 1), (1, 1)];

/// Fixed X-Z lattice of triangles covering `width × height`.
///
/// Vertices are emitted unshared (three per triangle) with `y = 0`. Heights
/// are injected later from world position; the grid itself never changes
/// after construction. Changing extents or subdivisions rebuilds everything.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: f32,
    height: f32,
    subdivisions: u32,
    step: Vec2,
    vertices: Vec<Vec3>,
}

impl TerrainGrid {
    pub fn new(width: f32, height: f32, subdivisions: u32) -> Result<Self, ConfigError> {
        Self::check_extents(width, height, subdivisions)?;

        let step = Vec2::new(width / subdivisions as f32, height / subdivisions as f32);
        let mut grid = Self {
            width,
            height,
            subdivisions,
            step,
            vertices: Vec::new(),
        };
        grid.vertices = grid.build_vertices();
        Ok(grid)
    }

    /// Validate grid dimensions without building any geometry.
    pub fn check_extents(width: f32, height: f32, subdivisions: u32) -> Result<(), ConfigError> {
        ensure_positive("terrain width", width)?;
        ensure_positive("terrain height", height)?;
        if subdivisions == 0 {
            return Err(ConfigError::ZeroSubdivisions);
        }
        if subdivisions > MAX_SUBDIVISIONS {
            return Err(ConfigError::OutOfRange {
                field: "subdivisions",
                value: subdivisions as f32,
                min: 1.0,
                max: MAX_SUBDIVISIONS as f32,
            });
        }
        Ok(())
    }

    /// Rebuild the whole lattice for new extents. On error the grid is unchanged.
    pub fn regenerate(
        &mut self,
        width: f32,
        height: f32,
        subdivisions: u32,
    ) -> Result<(), ConfigError> {
        *self = Self::new(width, height, subdivisions)?;
        Ok(())
    }

    fn build_vertices(&self) -> Vec<Vec3> {
        let n = self.subdivisions;
        let mut verts = Vec::with_capacity(self.vertex_count());
        // Rows along Z outermost, cells along X innermost.
        for j in 0..n {
            for i in 0..n {
                for (di, dj) in CELL_CORNERS {
                    let p = self.lattice_point(i + di, j + dj);
                    verts.push(Vec3::new(p.x, 0.0, p.y));
                }
            }
        }
        verts
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Cell size along X and Z.
    pub fn step(&self) -> Vec2 {
        self.step
    }

    /// Horizontal centre of the covered patch.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// X-Z position of lattice point `(i, j)`. Computed by multiplication so
    /// every caller sees bit-identical coordinates for the same point.
    pub fn lattice_point(&self, i: u32, j: u32) -> Vec2 {
        Vec2::new(i as f32 * self.step.x, j as f32 * self.step.y)
    }

    /// Number of lattice points per axis (`N + 1`).
    pub fn lattice_len(&self) -> usize {
        self.subdivisions as usize + 1
    }

    pub fn triangle_count(&self) -> usize {
        2 * (self.subdivisions as usize).pow(2)
    }

    pub fn vertex_count(&self) -> usize {
        6 * (self.subdivisions as usize).pow(2)
    }

    /// Emitted vertex positions, three per triangle, `y = 0`.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Flat face normal `normalize(cross(v1 − v0, v2 − v0))`.
///
/// Degenerate (zero-area) triangles get `+Y`.
pub fn face_normal(tri: [Vec3; 3]) -> Vec3 {
    let [v0, v1, v2] = tri;
    (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_subdivisions() {
        for n in [1u32, 2, 3, 7, 16] {
            let grid = TerrainGrid::new(15.0, 15.0, n).unwrap();
            let n = n as usize;
            assert_eq!(grid.triangle_count(), 2 * n * n);
            assert_eq!(grid.vertex_count(), 6 * n * n);
            assert_eq!(grid.vertices().len(), 6 * n * n);
            assert_eq!(grid.triangles().count(), 2 * n * n);
        }
    }

    #[test]
    fn counts_hold_for_awkward_steps() {
        // 0.1 does not divide evenly in binary; accumulation would add a column.
        let grid = TerrainGrid::new(1.0, 0.3, 10).unwrap();
        assert_eq!(grid.triangle_count(), 200);
        assert_eq!(grid.vertices().len(), 600);
    }

    #[test]
    fn single_cell_layout() {
        let grid = TerrainGrid::new(2.0, 4.0, 1).unwrap();
        let v = grid.vertices();
        assert_eq!(v[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(v[1], Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(v[2], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(v[3], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(v[4], Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(v[5], Vec3::new(2.0, 0.0, 4.0));
    }

    #[test]
    fn vertices_tile_the_extents() {
        let grid = TerrainGrid::new(15.0, 10.0, 8).unwrap();
        let (mut max_x, mut max_z) = (f32::MIN, f32::MIN);
        for v in grid.vertices() {
            assert_eq!(v.y, 0.0);
            assert!(v.x >= 0.0 && v.z >= 0.0);
            max_x = max_x.max(v.x);
            max_z = max_z.max(v.z);
        }
        assert!((max_x - 15.0).abs() < 1e-4);
        assert!((max_z - 10.0).abs() < 1e-4);
    }

    #[test]
    fn flat_triangles_face_up() {
        let grid = TerrainGrid::new(3.0, 3.0, 3).unwrap();
        for tri in grid.triangles() {
            let n = face_normal(tri);
            assert!((n - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn face_normal_tilts_with_slope() {
        let n = face_normal([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]);
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!(n.x < 0.0 && n.y > 0.0);
    }

    #[test]
    fn degenerate_triangle_gets_up_normal() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(face_normal([p, p, p]), Vec3::Y);
    }

    #[test]
    fn rejects_bad_extents() {
        assert!(matches!(
            TerrainGrid::new(0.0, 1.0, 4),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            TerrainGrid::new(1.0, f32::NAN, 4),
            Err(ConfigError::NonFinite { .. })
        ));
        assert_eq!(
            TerrainGrid::new(1.0, 1.0, 0).unwrap_err(),
            ConfigError::ZeroSubdivisions
        );
        assert!(matches!(
            TerrainGrid::new(1.0, 1.0, MAX_SUBDIVISIONS + 1),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn regenerate_replaces_geometry() {
        let mut grid = TerrainGrid::new(15.0, 15.0, 2).unwrap();
        grid.regenerate(5.0, 5.0, 4).unwrap();
        assert_eq!(grid.subdivisions(), 4);
        assert_eq!(grid.vertices().len(), 96);
        assert!(grid.regenerate(5.0, 5.0, 0).is_err());
        assert_eq!(grid.subdivisions(), 4);
    }
}
