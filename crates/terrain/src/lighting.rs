//! Reference implementation of the per-fragment terrain lighting.
//!
//! The GPU fragment program evaluates the same formula; this copy exists so
//! the contract can be checked without a device.

use glam::Vec3;

/// Constant ambient term applied to every fragment.
pub const AMBIENT: Vec3 = Vec3::splat(0.3);

/// Lambert factor `max(dot(n, normalize(light − p)), 0)`.
pub fn diffuse_factor(normal: Vec3, fragment_position: Vec3, light_position: Vec3) -> f32 {
    let to_light = (light_position - fragment_position).normalize_or_zero();
    normal.dot(to_light).max(0.0)
}

/// `(ambient + diffuse) * albedo` for a single point light. No specular, no shadows.
pub fn shade_fragment(
    normal: Vec3,
    fragment_position: Vec3,
    albedo: Vec3,
    light_position: Vec3,
    light_color: Vec3,
) -> Vec3 {
    let diffuse = diffuse_factor(normal, fragment_position, light_position) * light_color;
    (AMBIENT + diffuse) * albedo
}
