//! WGSL sources for the scene programs.
//!
//! Vertex and fragment stages are separate modules so a compile error can be
//! attributed to its stage. Each stage repeats the uniform block it reads.

use terrascape_scene::{ProgramKind, ShaderStage};

const TERRAIN_INTERFACE: &str = r#"
struct TerrainUniforms {
    model: mat4x4<f32>,
    vp: mat4x4<f32>,
    light_pos: vec3<f32>,
    light_color: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> u: TerrainUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) @interpolate(flat) normal: vec3<f32>,
    @location(2) @interpolate(flat) color: vec3<f32>,
};
"#;

const TERRAIN_VERTEX: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = u.vp * world;
    out.world_position = world.xyz;
    out.normal = normalize((u.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = vertex.color;
    return out;
}
"#;

const TERRAIN_FRAGMENT: &str = r#"
const AMBIENT: vec3<f32> = vec3<f32>(0.3, 0.3, 0.3);

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let to_light = u.light_pos - in.world_position;
    var diffuse = vec3<f32>(0.0);
    if (dot(to_light, to_light) > 0.0) {
        diffuse = max(dot(in.normal, normalize(to_light)), 0.0) * u.light_color;
    }
    return vec4<f32>((AMBIENT + diffuse) * in.color, 1.0);
}
"#;

const WATER_INTERFACE: &str = r#"
struct WaterUniforms {
    model: mat4x4<f32>,
    vp: mat4x4<f32>,
    color: vec3<f32>,
    water_level: f32,
    light_color: vec3<f32>,
    opacity: f32,
};

@group(0) @binding(0)
var<uniform> u: WaterUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};
"#;

const WATER_VERTEX: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var world = u.model * vec4<f32>(vertex.position, 1.0);
    world.y = world.y + u.water_level;
    var out: VertexOutput;
    out.clip_position = u.vp * world;
    out.uv = vertex.uv;
    return out;
}
"#;

const WATER_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(u.color * u.light_color, u.opacity);
}
"#;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Full WGSL source of one stage, or `None` for stages WGSL has no notion of.
pub fn source(kind: ProgramKind, stage: ShaderStage) -> Option<String> {
    let (interface, body) = match (kind, stage) {
        (ProgramKind::Terrain, ShaderStage::Vertex) => (TERRAIN_INTERFACE, TERRAIN_VERTEX),
        (ProgramKind::Terrain, ShaderStage::Fragment) => (TERRAIN_INTERFACE, TERRAIN_FRAGMENT),
        (ProgramKind::Water, ShaderStage::Vertex) => (WATER_INTERFACE, WATER_VERTEX),
        (ProgramKind::Water, ShaderStage::Fragment) => (WATER_INTERFACE, WATER_FRAGMENT),
        (_, ShaderStage::Geometry) => return None,
    };
    Some(format!("{interface}{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_both_stages() {
        for kind in [ProgramKind::Terrain, ProgramKind::Water] {
            let vs = source(kind, ShaderStage::Vertex).unwrap();
            let fs = source(kind, ShaderStage::Fragment).unwrap();
            assert!(vs.contains("@vertex") && vs.contains(VERTEX_ENTRY));
            assert!(fs.contains("@fragment") && fs.contains(FRAGMENT_ENTRY));
            assert!(source(kind, ShaderStage::Geometry).is_none());
        }
    }

    #[test]
    fn uniform_blocks_declare_every_named_uniform() {
        for kind in [ProgramKind::Terrain, ProgramKind::Water] {
            let vs = source(kind, ShaderStage::Vertex).unwrap();
            for (name, _) in kind.uniforms() {
                assert!(vs.contains(&format!("{name}:")), "{name} missing");
            }
        }
    }
}
