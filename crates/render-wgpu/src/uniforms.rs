use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use terrascape_scene::{ProgramKind, UniformValue};

/// Matches `TerrainUniforms` in WGSL; vec3 members are 16-byte aligned.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct TerrainUniforms {
    model: [[f32; 4]; 4],
    vp: [[f32; 4]; 4],
    light_pos: [f32; 3],
    _pad0: f32,
    light_color: [f32; 3],
    _pad1: f32,
}

/// Matches `WaterUniforms` in WGSL; each scalar packs into the tail of the
/// preceding vec3.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct WaterUniforms {
    model: [[f32; 4]; 4],
    vp: [[f32; 4]; 4],
    color: [f32; 3],
    water_level: f32,
    light_color: [f32; 3],
    opacity: f32,
}

/// CPU copy of a program's uniform buffer contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UniformBlock {
    Terrain(TerrainUniforms),
    Water(WaterUniforms),
}

impl UniformBlock {
    pub(crate) fn new(kind: ProgramKind) -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        match kind {
            ProgramKind::Terrain => UniformBlock::Terrain(TerrainUniforms {
                model: identity,
                vp: identity,
                ..Zeroable::zeroed()
            }),
            ProgramKind::Water => UniformBlock::Water(WaterUniforms {
                model: identity,
                vp: identity,
                ..Zeroable::zeroed()
            }),
        }
    }

    /// Store `value` under `name`. Callers validate names and types first;
    /// anything else is ignored.
    pub(crate) fn set(&mut self, name: &str, value: UniformValue) {
        match self {
            UniformBlock::Terrain(u) => match (name, value) {
                ("model", UniformValue::Mat4(m)) => u.model = m.to_cols_array_2d(),
                ("vp", UniformValue::Mat4(m)) => u.vp = m.to_cols_array_2d(),
                ("light_pos", UniformValue::Vec3(v)) => u.light_pos = v.to_array(),
                ("light_color", UniformValue::Vec3(v)) => u.light_color = v.to_array(),
                _ => {}
            },
            UniformBlock::Water(u) => match (name, value) {
                ("model", UniformValue::Mat4(m)) => u.model = m.to_cols_array_2d(),
                ("vp", UniformValue::Mat4(m)) => u.vp = m.to_cols_array_2d(),
                ("color", UniformValue::Vec3(v)) => u.color = v.to_array(),
                ("light_color", UniformValue::Vec3(v)) => u.light_color = v.to_array(),
                ("water_level", UniformValue::Float(f)) => u.water_level = f,
                ("opacity", UniformValue::Float(f)) => u.opacity = f,
                _ => {}
            },
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            UniformBlock::Terrain(u) => bytemuck::bytes_of(u),
            UniformBlock::Water(u) => bytemuck::bytes_of(u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn blocks_match_wgsl_struct_sizes() {
        assert_eq!(std::mem::size_of::<TerrainUniforms>(), 160);
        assert_eq!(std::mem::size_of::<WaterUniforms>(), 160);
    }

    #[test]
    fn terrain_fields_land_at_wgsl_offsets() {
        let mut block = UniformBlock::new(ProgramKind::Terrain);
        block.set("light_pos", UniformValue::Vec3(Vec3::new(3.0, 10.0, -4.0)));
        block.set("light_color", UniformValue::Vec3(Vec3::new(0.5, 0.25, 1.0)));
        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(&floats[32..35], &[3.0, 10.0, -4.0]);
        assert_eq!(&floats[36..39], &[0.5, 0.25, 1.0]);
    }

    #[test]
    fn water_scalars_pack_after_vec3() {
        let mut block = UniformBlock::new(ProgramKind::Water);
        block.set("color", UniformValue::Vec3(Vec3::new(0.0, 0.5, 1.0)));
        block.set("water_level", UniformValue::Float(0.055));
        block.set("light_color", UniformValue::Vec3(Vec3::ONE));
        block.set("opacity", UniformValue::Float(0.6));
        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(&floats[32..40], &[0.0, 0.5, 1.0, 0.055, 1.0, 1.0, 1.0, 0.6]);
    }

    #[test]
    fn matrices_are_column_major() {
        let mut block = UniformBlock::new(ProgramKind::Terrain);
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set("vp", UniformValue::Mat4(m));
        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(&floats[0..16], &Mat4::IDENTITY.to_cols_array());
        assert_eq!(&floats[16..32], &m.to_cols_array());
        assert_eq!(&floats[28..31], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn mismatched_values_are_ignored() {
        let mut block = UniformBlock::new(ProgramKind::Water);
        let before = block;
        block.set("opacity", UniformValue::Vec3(Vec3::ONE));
        block.set("light_pos", UniformValue::Vec3(Vec3::ONE));
        assert_eq!(block, before);
    }
}
