//! Heightfield synthesis: seeded Perlin noise (`fastnoise-lite`) summed over octaves.
//!
//! # Invariants
//! - Evaluation is pure: identical inputs give bit-identical output.
//! - Octave `i` is seeded with `seed + i` so octaves are decorrelated.
//! - Raw fractal output is normalized by the summed amplitude before contrast.
//! - Finite input gives finite output; octaves past the `i32` lattice range contribute zero.

mod fractal;

pub use fractal::{
    HeightSource, MAX_LATTICE_COORDINATE, NoiseParameters, OCTAVES, apply_contrast, height,
    raw_height,
};
