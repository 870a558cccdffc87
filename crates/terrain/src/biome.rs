use glam::Vec3;
use terrascape_common::Rgb;

/// Lower bounds of each band, on post-contrast height.
pub const SNOW_LINE: f32 = 0.3;
pub const ROCK_LINE: f32 = 0.02;
pub const GRASS_LINE: f32 = -0.01;

/// Surface class chosen from a triangle's height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    /// `h ≥ 0.3`
    Snow,
    /// `0.02 ≤ h < 0.3`
    Rock,
    /// `-0.01 ≤ h < 0.02`
    Grass,
    /// Everything below, NaN included.
    Sand,
}

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Snow, Biome::Rock, Biome::Grass, Biome::Sand];

    /// Thresholds are checked from highest to lowest; each band is closed at
    /// its lower bound, so every `f32` lands in exactly one biome.
    pub fn from_height(h: f32) -> Self {
        if h >= SNOW_LINE {
            Biome::Snow
        } else if h >= ROCK_LINE {
            Biome::Rock
        } else if h >= GRASS_LINE {
            Biome::Grass
        } else {
            Biome::Sand
        }
    }

    /// Biome of a triangle, keyed on the mean of its three vertex heights.
    pub fn for_triangle(heights: [f32; 3]) -> Self {
        Self::from_height(representative_height(heights))
    }

    pub fn color(self) -> Rgb {
        match self {
            Biome::Snow => Rgb::from_u8(200, 200, 200),
            Biome::Rock => Rgb::from_u8(100, 100, 100),
            Biome::Grass => Rgb::from_u8(36, 140, 64),
            Biome::Sand => Rgb::from_u8(255, 224, 138),
        }
    }

    pub fn albedo(self) -> Vec3 {
        self.color().to_vec3()
    }

    pub fn label(self) -> &'static str {
        match self {
            Biome::Snow => "snow",
            Biome::Rock => "rock",
            Biome::Grass => "grass",
            Biome::Sand => "sand",
        }
    }
}

pub(crate) fn representative_height(heights: [f32; 3]) -> f32 {
    (heights[0] + heights[1] + heights[2]) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        assert_eq!(Biome::from_height(0.3), Biome::Snow);
        assert_eq!(Biome::from_height(0.299_99), Biome::Rock);
        assert_eq!(Biome::from_height(0.02), Biome::Rock);
        assert_eq!(Biome::from_height(0.019_99), Biome::Grass);
        assert_eq!(Biome::from_height(-0.01), Biome::Grass);
        assert_eq!(Biome::from_height(-0.010_01), Biome::Sand);
    }

    #[test]
    fn total_over_extremes() {
        assert_eq!(Biome::from_height(f32::INFINITY), Biome::Snow);
        assert_eq!(Biome::from_height(f32::MAX), Biome::Snow);
        assert_eq!(Biome::from_height(f32::NEG_INFINITY), Biome::Sand);
        assert_eq!(Biome::from_height(f32::NAN), Biome::Sand);
    }

    #[test]
    fn dense_sweep_has_no_gaps() {
        // Walking upward, the biome only ever steps Sand → Grass → Rock → Snow.
        let order = |b: Biome| match b {
            Biome::Sand => 0,
            Biome::Grass => 1,
            Biome::Rock => 2,
            Biome::Snow => 3,
        };
        let mut last = 0;
        for i in -20_000..=20_000 {
            let b = Biome::from_height(i as f32 * 1e-4);
            let rank = order(b);
            assert!(rank >= last);
            assert!(rank - last <= 1);
            last = rank;
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn triangle_uses_mean_height() {
        assert_eq!(Biome::for_triangle([0.3, 0.3, 0.9]), Biome::Snow);
        assert_eq!(Biome::for_triangle([0.0, 0.0, 0.3]), Biome::Rock);
        assert_eq!(Biome::for_triangle([-0.3, 0.0, 0.0]), Biome::Sand);
    }

    #[test]
    fn palette_values() {
        assert_eq!(Biome::Grass.color(), Rgb::from_u8(36, 140, 64));
        for b in Biome::ALL {
            assert!(b.color().validate("biome").is_ok());
        }
    }
}
