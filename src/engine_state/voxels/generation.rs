//! # Terrain Generation
//!
//! Seeded, deterministic terrain. A low-frequency Perlin field picks the
//! [`Biome`] of each column and the height parameters that go with it. A 2D
//! height field built from several Perlin octaves then gives each column a
//! surface height; the column is filled with grass on top, three layers of
//! dirt and stone below. A 3D Perlin field carves caves out of everything
//! under the surface.
//!
//! Generation is a pure function of the seed and the chunk coordinate, so a
//! chunk that was never edited can be dropped on unload and regenerated later.

use noise::{NoiseFn, Perlin};

use super::biome::{Biome, BiomeColumns};
use super::block::{block_type::BlockType, Block};
use super::chunk::{Chunk, CHUNK_DIMENSION, CHUNK_SIZE};
use super::coordinates::{chunk_origin, ChunkCoordinate};

/// Number of octaves summed for the height field.
pub const HEIGHT_OCTAVES: u32 = 4;
/// Scaling factor applied to world coordinates when sampling the height field.
pub const HEIGHT_SCALE_FACTOR: f64 = 0.008;
/// Scaling factor applied to world coordinates when sampling the biome field.
pub const BIOME_SCALE_FACTOR: f64 = 0.003;
/// Scaling factor applied to world coordinates when sampling cave noise.
pub const CAVE_SCALE_FACTOR: f64 = 0.06;
/// Cave noise above this value is carved out.
pub const CAVE_THRESHOLD: f64 = 0.45;
/// Number of dirt layers between the grass and the stone.
pub const DIRT_DEPTH: i32 = 3;

/// Produces chunks of terrain for a fixed seed.
///
/// The generator is read-only after construction and shared between worker
/// threads behind an `Arc`.
pub struct TerrainGenerator {
    seed: u32,
    height: Perlin,
    caves: Perlin,
    biomes: Perlin,
}

impl TerrainGenerator {
    pub fn new(seed: u32) -> Self {
        TerrainGenerator {
            seed,
            height: Perlin::new(seed),
            caves: Perlin::new(seed.wrapping_add(0x9E37)),
            biomes: Perlin::new(seed.wrapping_add(42)),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The highest surface the height field can produce.
    pub fn max_height() -> i32 {
        Biome::ALL
            .iter()
            .map(|biome| biome.shape().base_height + biome.shape().amplitude)
            .fold(f64::MIN, f64::max)
            .ceil() as i32
    }

    /// The lowest surface the height field can produce.
    pub fn min_height() -> i32 {
        Biome::ALL
            .iter()
            .map(|biome| biome.shape().base_height - biome.shape().amplitude)
            .fold(f64::MAX, f64::min)
            .floor() as i32
    }

    fn biome_noise(&self, x: i32, z: i32) -> f64 {
        self.biomes
            .get([x as f64 * BIOME_SCALE_FACTOR, z as f64 * BIOME_SCALE_FACTOR])
            .clamp(-1.0, 1.0)
    }

    /// Biome of the column at world `(x, z)`.
    pub fn biome_at(&self, x: i32, z: i32) -> Biome {
        Biome::from_noise(self.biome_noise(x, z))
    }

    /// Biomes of every column of the chunk at `coordinate`.
    pub fn biome_columns(&self, coordinate: ChunkCoordinate) -> BiomeColumns {
        let origin = chunk_origin(coordinate);
        BiomeColumns::from_fn(|x, z| self.biome_at(origin.x + x, origin.z + z))
    }

    /// Surface height of the column at world `(x, z)`. The block at this
    /// height is the topmost solid block of the column before caves.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let shape = Biome::blended_shape(self.biome_noise(x, z));
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = HEIGHT_SCALE_FACTOR;
        let mut total = 0.0;
        for _ in 0..HEIGHT_OCTAVES {
            sum += self.height.get([x as f64 * frequency, z as f64 * frequency]) * amplitude;
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        let relief = (sum / total).clamp(-1.0, 1.0);
        (shape.base_height + shape.amplitude * relief).floor() as i32
    }

    fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        let sample = self.caves.get([
            x as f64 * CAVE_SCALE_FACTOR,
            y as f64 * CAVE_SCALE_FACTOR * 1.5,
            z as f64 * CAVE_SCALE_FACTOR,
        ]);
        sample > CAVE_THRESHOLD
    }

    /// Block at world `(x, y, z)` given the column's surface height.
    fn block_at(&self, x: i32, y: i32, z: i32, surface: i32) -> BlockType {
        if y > surface {
            return BlockType::AIR;
        }
        // Keep the surface layer intact so caves do not pock the ground.
        if y < surface - 1 && self.is_cave(x, y, z) {
            return BlockType::AIR;
        }
        if y == surface {
            BlockType::GRASS
        } else if y > surface - 1 - DIRT_DEPTH {
            BlockType::DIRT
        } else {
            BlockType::STONE
        }
    }

    /// Generates the chunk at `coordinate`. The result is clean and unedited.
    pub fn generate(&self, coordinate: ChunkCoordinate) -> Chunk {
        let origin = chunk_origin(coordinate);
        if origin.y > Self::max_height() {
            return Chunk::empty(coordinate);
        }

        let mut surface = [[0i32; CHUNK_DIMENSION as usize]; CHUNK_DIMENSION as usize];
        for (dz, row) in surface.iter_mut().enumerate() {
            for (dx, height) in row.iter_mut().enumerate() {
                *height = self.surface_height(origin.x + dx as i32, origin.z + dz as i32);
            }
        }

        let mut blocks = Vec::with_capacity(CHUNK_SIZE as usize);
        for dz in 0..CHUNK_DIMENSION {
            for dy in 0..CHUNK_DIMENSION {
                for dx in 0..CHUNK_DIMENSION {
                    let (x, y, z) = (origin.x + dx, origin.y + dy, origin.z + dz);
                    let column = surface[dz as usize][dx as usize];
                    blocks.push(Block::new(self.block_at(x, y, z, column)));
                }
            }
        }

        match Chunk::from_blocks(coordinate, blocks) {
            Some(chunk) => chunk,
            None => Chunk::empty(coordinate),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn same_seed_gives_same_chunk() {
        let a = TerrainGenerator::new(7).generate(Point3::new(2, 0, -3));
        let b = TerrainGenerator::new(7).generate(Point3::new(2, 0, -3));
        assert_eq!(a.blocks(), b.blocks());
        assert!(!a.is_edited());
        assert!(!a.is_dirty());
    }

    #[test]
    fn chunks_above_terrain_are_empty() {
        let generator = TerrainGenerator::new(1);
        let chunk = generator.generate(Point3::new(0, 10, 0));
        assert!(chunk.is_empty());
    }

    #[test]
    fn columns_are_grass_over_dirt_over_stone() {
        let generator = TerrainGenerator::new(3);
        let surface = generator.surface_height(5, 9);
        assert_eq!(generator.block_at(5, surface + 1, 9, surface), BlockType::AIR);
        assert_eq!(generator.block_at(5, surface, 9, surface), BlockType::GRASS);
        assert_eq!(generator.block_at(5, surface - 1, 9, surface), BlockType::DIRT);
    }

    #[test]
    fn surface_stays_within_amplitude() {
        let generator = TerrainGenerator::new(11);
        for x in (-200..200).step_by(17) {
            for z in (-200..200).step_by(13) {
                let h = generator.surface_height(x, z);
                assert!(h <= TerrainGenerator::max_height());
                assert!(h >= TerrainGenerator::min_height());
            }
        }
    }

    #[test]
    fn biomes_are_fixed_by_the_seed() {
        let a = TerrainGenerator::new(21);
        let b = TerrainGenerator::new(21);
        let other = TerrainGenerator::new(22);

        let mut differs = false;
        for x in (-3000..3000).step_by(250) {
            for z in (-3000..3000).step_by(250) {
                assert_eq!(a.biome_at(x, z), b.biome_at(x, z));
                differs |= a.biome_noise(x, z) != other.biome_noise(x, z);
            }
        }
        assert!(differs);

        let coordinate = Point3::new(-7, 0, 12);
        assert_eq!(a.biome_columns(coordinate), b.biome_columns(coordinate));
        let origin = chunk_origin(coordinate);
        assert_eq!(
            a.biome_columns(coordinate).get(5, 9),
            a.biome_at(origin.x + 5, origin.z + 9)
        );
    }

    #[test]
    fn surface_follows_the_biome_shape() {
        let generator = TerrainGenerator::new(4);
        for x in (-2000..2000).step_by(97) {
            for z in (-2000..2000).step_by(89) {
                let shape = Biome::blended_shape(generator.biome_noise(x, z));
                let h = f64::from(generator.surface_height(x, z));
                assert!(h <= shape.base_height + shape.amplitude);
                assert!(h >= (shape.base_height - shape.amplitude).floor());
            }
        }
    }
}
