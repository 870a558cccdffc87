use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use serde::Serialize;
use terrascape_common::{ConfigError, ensure_finite, ensure_positive};

/// Number of octaves summed per height sample.
pub const OCTAVES: i32 = 6;

/// Lattice cells are indexed by `i32`, so an octave is only sampled while its
/// scaled coordinates stay strictly inside ±2³¹.
pub const MAX_LATTICE_COORDINATE: f32 = 2_147_483_648.0;

const DEFAULT_SEED: i32 = 314_159_265;
const DEFAULT_AMPLITUDE: f32 = 1.0;
const DEFAULT_FREQUENCY: f32 = 1.0;
const DEFAULT_GAIN: f32 = 0.5;
const DEFAULT_LACUNARITY: f32 = 2.0;
const DEFAULT_FUDGE: f32 = 1.2;

/// Anything that can report a terrain height at a world-space X-Z point.
pub trait HeightSource {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Fractal noise settings.
///
/// Amplitude, frequency, gain, and lacunarity are always strictly positive
/// and finite; the fudge (contrast) factor is always finite. All mutation
/// goes through validated setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseParameters {
    seed: i32,
    amplitude: f32,
    frequency: f32,
    gain: f32,
    lacunarity: f32,
    fudge: f32,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            amplitude: DEFAULT_AMPLITUDE,
            frequency: DEFAULT_FREQUENCY,
            gain: DEFAULT_GAIN,
            lacunarity: DEFAULT_LACUNARITY,
            fudge: DEFAULT_FUDGE,
        }
    }
}

impl NoiseParameters {
    pub fn new(
        seed: i32,
        amplitude: f32,
        frequency: f32,
        gain: f32,
        lacunarity: f32,
        fudge: f32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            seed,
            amplitude: ensure_positive("amplitude", amplitude)?,
            frequency: ensure_positive("frequency", frequency)?,
            gain: ensure_positive("gain", gain)?,
            lacunarity: ensure_positive("lacunarity", lacunarity)?,
            fudge: ensure_finite("fudge", fudge)?,
        })
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn lacunarity(&self) -> f32 {
        self.lacunarity
    }

    pub fn fudge(&self) -> f32 {
        self.fudge
    }

    pub fn set_seed(&mut self, seed: i32) {
        self.seed = seed;
    }

    pub fn set_amplitude(&mut self, value: f32) -> Result<(), ConfigError> {
        self.amplitude = ensure_positive("amplitude", value)?;
        Ok(())
    }

    pub fn set_frequency(&mut self, value: f32) -> Result<(), ConfigError> {
        self.frequency = ensure_positive("frequency", value)?;
        Ok(())
    }

    pub fn set_gain(&mut self, value: f32) -> Result<(), ConfigError> {
        self.gain = ensure_positive("gain", value)?;
        Ok(())
    }

    pub fn set_lacunarity(&mut self, value: f32) -> Result<(), ConfigError> {
        self.lacunarity = ensure_positive("lacunarity", value)?;
        Ok(())
    }

    pub fn set_fudge(&mut self, value: f32) -> Result<(), ConfigError> {
        self.fudge = ensure_finite("fudge", value)?;
        Ok(())
    }

    /// Restore the shaping parameters to their defaults. The seed is kept.
    pub fn reset_settings(&mut self) {
        *self = Self {
            seed: self.seed,
            ..Self::default()
        };
    }

    /// Post-contrast height at `(x, z)` using this parameter set's own seed.
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        height(self.seed, x, z, self)
    }
}

impl HeightSource for NoiseParameters {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.sample(x, z)
    }
}

/// Single Perlin octave at unit frequency; all scaling happens in [`raw_height`].
fn octave_noise(seed: i32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::Perlin));
    noise.set_fractal_type(Some(FractalType::None));
    noise.set_frequency(Some(1.0));
    noise
}

fn in_lattice_range(v: f32) -> bool {
    v.abs() < MAX_LATTICE_COORDINATE
}

/// Fractal sum of [`OCTAVES`] Perlin octaves, normalized by the summed
/// amplitude so the result stays roughly in [-1, 1].
///
/// Octave `i` samples at `(x, z) * frequency * lacunarity^i`. An octave whose
/// scaled coordinate falls outside ±[`MAX_LATTICE_COORDINATE`] contributes
/// zero but keeps its weight, so the result is finite for every finite input.
pub fn raw_height(seed: i32, x: f32, z: f32, params: &NoiseParameters) -> f32 {
    let mut sum = 0.0;
    let mut total_amplitude = 0.0;
    let mut amplitude = params.amplitude;
    let mut frequency = params.frequency;

    for octave in 0..OCTAVES {
        let (sx, sz) = (x * frequency, z * frequency);
        if in_lattice_range(sx) && in_lattice_range(sz) {
            sum += amplitude * octave_noise(seed.wrapping_add(octave)).get_noise_2d(sx, sz);
        }
        total_amplitude += amplitude;
        amplitude *= params.gain;
        frequency *= params.lacunarity;
    }

    sum / total_amplitude
}

/// `(raw * fudge)³`. Odd power, so the sign of `raw` survives.
#[inline]
pub fn apply_contrast(raw: f32, fudge: f32) -> f32 {
    let scaled = raw * fudge;
    scaled * scaled * scaled
}

/// Terrain height at `(x, z)`: the fractal sum with contrast applied.
///
/// Same coordinate range as [`raw_height`].
pub fn height(seed: i32, x: f32, z: f32, params: &NoiseParameters) -> f32 {
    apply_contrast(raw_height(seed, x, z, params), params.fudge)
}
