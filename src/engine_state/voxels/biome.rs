//! # Biomes
//!
//! A low-frequency noise field splits the world into plains, a temperate
//! middle band and mountains. The biome of a column decides how tall and
//! rough its terrain is, and the colour its grass and leaves are tinted with.
//!
//! Terrain shape is blended across the band edges so the surface never steps;
//! the biome itself (and with it the tint) switches at fixed thresholds.

use super::chunk::CHUNK_DIMENSION;

/// Biome noise above this value is mountains, below its negation plains.
pub const BIOME_THRESHOLD: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    Plains,
    Temperate,
    Mountains,
}

/// Height field parameters of a biome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainShape {
    /// Average surface height in blocks.
    pub base_height: f64,
    /// Maximum deviation of the surface from `base_height`.
    pub amplitude: f64,
}

impl TerrainShape {
    fn lerp(self, other: TerrainShape, t: f64) -> TerrainShape {
        TerrainShape {
            base_height: self.base_height + (other.base_height - self.base_height) * t,
            amplitude: self.amplitude + (other.amplitude - self.amplitude) * t,
        }
    }
}

fn rgb(r: u8, g: u8, b: u8) -> [f32; 3] {
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    ]
}

impl Biome {
    pub const ALL: [Biome; 3] = [Biome::Plains, Biome::Temperate, Biome::Mountains];

    /// Biome for a biome noise sample in `[-1, 1]`.
    pub fn from_noise(sample: f64) -> Biome {
        if sample > BIOME_THRESHOLD {
            Biome::Mountains
        } else if sample < -BIOME_THRESHOLD {
            Biome::Plains
        } else {
            Biome::Temperate
        }
    }

    pub fn shape(self) -> TerrainShape {
        match self {
            Biome::Plains => TerrainShape {
                base_height: 8.0,
                amplitude: 6.0,
            },
            Biome::Temperate => TerrainShape {
                base_height: 12.0,
                amplitude: 16.0,
            },
            Biome::Mountains => TerrainShape {
                base_height: 22.0,
                amplitude: 30.0,
            },
        }
    }

    /// Terrain shape for a biome noise sample, interpolated between the
    /// middle band and whichever extreme the sample leans towards.
    pub fn blended_shape(sample: f64) -> TerrainShape {
        let t = (sample.abs() / BIOME_THRESHOLD).min(1.0);
        let extreme = if sample < 0.0 {
            Biome::Plains
        } else {
            Biome::Mountains
        };
        Biome::Temperate.shape().lerp(extreme.shape(), t)
    }

    /// Colour multiplied into grass tops.
    pub fn grass_tint(self) -> [f32; 3] {
        match self {
            Biome::Plains => rgb(145, 189, 89),
            Biome::Temperate => rgb(121, 192, 90),
            Biome::Mountains => rgb(138, 182, 137),
        }
    }

    /// Colour multiplied into leaves.
    pub fn foliage_tint(self) -> [f32; 3] {
        match self {
            Biome::Plains => rgb(119, 171, 47),
            Biome::Temperate => rgb(89, 174, 48),
            Biome::Mountains => rgb(109, 163, 107),
        }
    }
}

/// The biome of every column of a chunk, indexed `x + CHUNK_DIMENSION * z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomeColumns {
    columns: Vec<Biome>,
}

impl BiomeColumns {
    pub fn uniform(biome: Biome) -> Self {
        BiomeColumns {
            columns: vec![biome; (CHUNK_DIMENSION * CHUNK_DIMENSION) as usize],
        }
    }

    /// Builds the table by calling `biome_at(x, z)` for each local column.
    pub fn from_fn(mut biome_at: impl FnMut(i32, i32) -> Biome) -> Self {
        let mut columns = Vec::with_capacity((CHUNK_DIMENSION * CHUNK_DIMENSION) as usize);
        for z in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                columns.push(biome_at(x, z));
            }
        }
        BiomeColumns { columns }
    }

    /// Biome of local column `(x, z)`. Coordinates are clamped into the chunk.
    pub fn get(&self, x: i32, z: i32) -> Biome {
        let x = x.clamp(0, CHUNK_DIMENSION - 1);
        let z = z.clamp(0, CHUNK_DIMENSION - 1);
        self.columns[(x + CHUNK_DIMENSION * z) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_split_the_noise_range() {
        assert_eq!(Biome::from_noise(-0.9), Biome::Plains);
        assert_eq!(Biome::from_noise(0.0), Biome::Temperate);
        assert_eq!(Biome::from_noise(0.34), Biome::Temperate);
        assert_eq!(Biome::from_noise(0.5), Biome::Mountains);
    }

    #[test]
    fn shape_blends_without_steps() {
        assert_eq!(Biome::blended_shape(0.0), Biome::Temperate.shape());
        assert_eq!(Biome::blended_shape(0.8), Biome::Mountains.shape());
        assert_eq!(Biome::blended_shape(-BIOME_THRESHOLD), Biome::Plains.shape());

        let below = Biome::blended_shape(BIOME_THRESHOLD - 1e-6);
        let above = Biome::blended_shape(BIOME_THRESHOLD + 1e-6);
        assert!((below.base_height - above.base_height).abs() < 1e-3);
    }

    #[test]
    fn columns_are_stored_x_fastest() {
        let columns = BiomeColumns::from_fn(|x, _| {
            if x < 8 {
                Biome::Plains
            } else {
                Biome::Mountains
            }
        });
        assert_eq!(columns.get(3, 15), Biome::Plains);
        assert_eq!(columns.get(12, 0), Biome::Mountains);
        assert_eq!(columns.get(99, 0), Biome::Mountains);
    }
}
