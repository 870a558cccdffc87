//! wgpu backend for terrascape scenes.
//!
//! Implements [`GraphicsBackend`](terrascape_scene::GraphicsBackend) with two
//! WGSL programs: flat-shaded terrain lit by one point light, and a
//! translucent water plane.
//!
//! # Invariants
//! - Program compilation errors are returned, never raised as device panics.
//! - Each draw sees the uniforms that were set when it was issued.
//! - WGSL has no geometry stage; requesting one is `Unsupported`.

mod gpu;
mod shaders;
mod uniforms;

pub use gpu::WgpuBackend;
