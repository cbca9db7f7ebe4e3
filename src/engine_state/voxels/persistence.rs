//! # Chunk Persistence
//!
//! Saves edited chunks to disk and reads them back. Untouched terrain is never
//! written; it is regenerated from the world seed.
//!
//! ## Layout
//!
//! ```text
//! <root>/world.json
//! <root>/region_<rx>_<ry>_<rz>/chunk_<x>_<y>_<z>.bin
//! ```
//!
//! A region groups 32 chunks per axis, using floor division so negative chunk
//! coordinates get their own regions.
//!
//! ## Chunk File Format
//!
//! All integers little endian.
//!
//! | field          | type        |
//! |----------------|-------------|
//! | magic          | `b"VXCK"`   |
//! | format version | `u16`       |
//! | coordinate     | `i32` x 3   |
//! | block version  | `u64`       |
//! | block ids      | RLE stream  |
//! | metadata       | RLE stream  |
//!
//! An RLE stream is a sequence of `(value: u8, run: u16)` pairs with
//! `run` in `1..=0x7FFF`, ended by a pair whose run is zero. The runs of a
//! stream must add up to exactly one chunk of blocks.
//!
//! Files are written to a `.tmp` sibling and renamed into place.
//!
//! ## Stash
//!
//! Edited chunks that leave the load radius go into an in-memory LRU stash
//! first. They are only written when pushed out of the stash or when the
//! store is flushed, so walking back and forth over a boundary does not hit
//! the disk.
//!
//! The stash belongs to the main thread: only it unstashes chunks, and it
//! puts them straight back into the world. Generation workers only read
//! chunk files, which never removes anything.

use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use cgmath::Point3;
use log::{debug, error, info, warn};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::chunk::{Chunk, CHUNK_SIZE};
use super::coordinates::ChunkCoordinate;
use crate::error::StorageError;

pub const CHUNK_MAGIC: &[u8; 4] = b"VXCK";
pub const CHUNK_FORMAT_VERSION: u16 = 1;
pub const REGION_DIMENSION: i32 = 32;
pub const MAX_RUN: u16 = 0x7FFF;
pub const METADATA_FILE: &str = "world.json";

const HEADER_LEN: usize = 4 + 2 + 12 + 8;

/// Contents of `world.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMetadata {
    pub seed: u32,
    pub format_version: u16,
}

/// Disk-backed store for edited chunks.
pub struct ChunkStore {
    root: PathBuf,
    persist: bool,
    stash: LruCache<ChunkCoordinate, Chunk>,
}

impl ChunkStore {
    /// Opens a store rooted at `root`, creating the directory when persisting.
    pub fn open(root: &Path, stash_capacity: usize, persist: bool) -> Result<Self, StorageError> {
        if persist {
            fs::create_dir_all(root)?;
        }
        let mut store = Self::unsaved(root, stash_capacity);
        store.persist = persist;
        Ok(store)
    }

    /// A store that keeps its stash in memory and never touches the disk.
    pub fn unsaved(root: &Path, stash_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(stash_capacity).unwrap_or(NonZeroUsize::MIN);
        ChunkStore {
            root: root.to_path_buf(),
            persist: false,
            stash: LruCache::new(capacity),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stashed_count(&self) -> usize {
        self.stash.len()
    }

    /// Reads `world.json`, or creates it.
    ///
    /// A saved seed always wins over `configured_seed`. Without either, a
    /// random seed is chosen.
    pub fn load_or_create_metadata(
        &self,
        configured_seed: Option<u32>,
    ) -> Result<WorldMetadata, StorageError> {
        let path = self.root.join(METADATA_FILE);

        if self.persist && path.exists() {
            let metadata: WorldMetadata = serde_json::from_str(&fs::read_to_string(&path)?)?;
            if metadata.format_version != CHUNK_FORMAT_VERSION {
                return Err(StorageError::UnsupportedVersion {
                    expected: CHUNK_FORMAT_VERSION,
                    found: metadata.format_version,
                });
            }
            if let Some(seed) = configured_seed.filter(|seed| *seed != metadata.seed) {
                warn!(
                    "Configured seed {seed} ignored, {} was saved with seed {}",
                    self.root.display(),
                    metadata.seed
                );
            }
            info!("Loaded world metadata from {}", path.display());
            return Ok(metadata);
        }

        let metadata = WorldMetadata {
            seed: configured_seed.unwrap_or_else(|| fastrand::u32(..)),
            format_version: CHUNK_FORMAT_VERSION,
        };
        if self.persist {
            write_atomically(&path, serde_json::to_string_pretty(&metadata)?.as_bytes())?;
            info!("Created world metadata at {}", path.display());
        }
        Ok(metadata)
    }

    /// Directory holding the region that contains `coordinate`.
    pub fn region_path(&self, coordinate: ChunkCoordinate) -> PathBuf {
        self.root.join(format!(
            "region_{}_{}_{}",
            coordinate.x.div_euclid(REGION_DIMENSION),
            coordinate.y.div_euclid(REGION_DIMENSION),
            coordinate.z.div_euclid(REGION_DIMENSION),
        ))
    }

    pub fn chunk_path(&self, coordinate: ChunkCoordinate) -> PathBuf {
        self.region_path(coordinate).join(format!(
            "chunk_{}_{}_{}.bin",
            coordinate.x, coordinate.y, coordinate.z
        ))
    }

    /// Keeps an unloaded edited chunk in memory. If the stash is full the
    /// least recently stashed chunk is written to disk.
    pub fn stash(&mut self, mut chunk: Chunk) -> Result<(), StorageError> {
        chunk.take_mesh();
        let coordinate = chunk.position;
        match self.stash.push(coordinate, chunk) {
            Some((evicted_coordinate, evicted)) if evicted_coordinate != coordinate => {
                debug!("Stash full, writing chunk {evicted_coordinate:?}");
                self.save(&evicted)
            }
            _ => Ok(()),
        }
    }

    /// Removes a chunk from the stash, handing its edits to the caller.
    pub fn unstash(&mut self, coordinate: ChunkCoordinate) -> Option<Chunk> {
        self.stash.pop(&coordinate)
    }

    /// Reads a chunk file without touching the stash.
    ///
    /// Returns `Ok(None)` when the chunk was never written.
    pub fn read(&self, coordinate: ChunkCoordinate) -> Result<Option<Chunk>, StorageError> {
        if !self.persist {
            return Ok(None);
        }
        let bytes = match fs::read(self.chunk_path(coordinate)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_chunk(&bytes, coordinate).map(Some)
    }

    /// Whether a chunk is in the stash or has a file on disk.
    pub fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.stash.contains(&coordinate)
            || (self.persist && self.chunk_path(coordinate).exists())
    }

    /// Writes a chunk file. Does nothing when persistence is disabled.
    pub fn save(&self, chunk: &Chunk) -> Result<(), StorageError> {
        if !self.persist {
            debug!("Persistence disabled, dropping chunk {:?}", chunk.position);
            return Ok(());
        }
        fs::create_dir_all(self.region_path(chunk.position))?;
        write_atomically(&self.chunk_path(chunk.position), &encode_chunk(chunk))
    }

    /// Writes every stashed chunk to disk and empties the stash. Returns the
    /// number of chunks written. Failures are logged and the rest still written.
    pub fn flush(&mut self) -> usize {
        let mut written = 0;
        while let Some((coordinate, chunk)) = self.stash.pop_lru() {
            match self.save(&chunk) {
                Ok(()) => written += 1,
                Err(e) => error!("Failed to save chunk {coordinate:?}: {e}"),
            }
        }
        written
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Serializes a chunk in the chunk file format.
pub fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 64);
    out.extend_from_slice(CHUNK_MAGIC);
    out.extend_from_slice(&CHUNK_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&chunk.position.x.to_le_bytes());
    out.extend_from_slice(&chunk.position.y.to_le_bytes());
    out.extend_from_slice(&chunk.position.z.to_le_bytes());
    out.extend_from_slice(&chunk.version().to_le_bytes());

    write_rle(&mut out, chunk.blocks().iter().map(|block| block.block_type));
    write_rle(&mut out, chunk.blocks().iter().map(|block| block.metadata));
    out
}

fn write_rle(out: &mut Vec<u8>, values: impl Iterator<Item = u8>) {
    let mut run: Option<(u8, u16)> = None;
    for value in values {
        run = match run {
            Some((current, length)) if current == value && length < MAX_RUN => {
                Some((current, length + 1))
            }
            Some((current, length)) => {
                push_run(out, current, length);
                Some((value, 1))
            }
            None => Some((value, 1)),
        };
    }
    if let Some((current, length)) = run {
        push_run(out, current, length);
    }
    push_run(out, 0, 0);
}

fn push_run(out: &mut Vec<u8>, value: u8, length: u16) {
    out.push(value);
    out.extend_from_slice(&length.to_le_bytes());
}

/// Cursor over a byte slice that reports truncation as corruption.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], StorageError> {
        if self.bytes.len() < N {
            return Err(StorageError::Corrupt("unexpected end of file"));
        }
        let (head, rest) = self.bytes.split_at(N);
        self.bytes = rest;
        let mut array = [0u8; N];
        array.copy_from_slice(head);
        Ok(array)
    }

    fn read_rle(&mut self, len: usize) -> Result<Vec<u8>, StorageError> {
        let mut values = Vec::with_capacity(len);
        loop {
            let [value] = self.take::<1>()?;
            let run = u16::from_le_bytes(self.take::<2>()?);
            if run == 0 {
                break;
            }
            if run > MAX_RUN {
                return Err(StorageError::Corrupt("run length out of range"));
            }
            if values.len() + run as usize > len {
                return Err(StorageError::Corrupt("runs exceed chunk size"));
            }
            values.extend(std::iter::repeat(value).take(run as usize));
        }
        if values.len() != len {
            return Err(StorageError::Corrupt("runs do not fill the chunk"));
        }
        Ok(values)
    }
}

/// Parses a chunk file. The stored coordinate must equal `expected`.
///
/// The returned chunk is marked edited, since only edited chunks are saved.
pub fn decode_chunk(bytes: &[u8], expected: ChunkCoordinate) -> Result<Chunk, StorageError> {
    let mut reader = Reader { bytes };

    if &reader.take::<4>()? != CHUNK_MAGIC {
        return Err(StorageError::BadMagic);
    }
    let version = u16::from_le_bytes(reader.take::<2>()?);
    if version != CHUNK_FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            expected: CHUNK_FORMAT_VERSION,
            found: version,
        });
    }

    let found = Point3::new(
        i32::from_le_bytes(reader.take::<4>()?),
        i32::from_le_bytes(reader.take::<4>()?),
        i32::from_le_bytes(reader.take::<4>()?),
    );
    if found != expected {
        return Err(StorageError::CoordinateMismatch { expected, found });
    }
    let block_version = u64::from_le_bytes(reader.take::<8>()?);

    let ids = reader.read_rle(CHUNK_SIZE as usize)?;
    let metadata = reader.read_rle(CHUNK_SIZE as usize)?;
    if !reader.bytes.is_empty() {
        return Err(StorageError::Corrupt("trailing bytes after chunk data"));
    }

    let blocks = ids
        .into_iter()
        .zip(metadata)
        .map(|(block_type, metadata)| Block {
            block_type,
            metadata,
        })
        .collect();

    let mut chunk =
        Chunk::from_blocks(found, blocks).ok_or(StorageError::Corrupt("wrong block count"))?;
    chunk.set_version(block_version);
    chunk.set_edited(true);
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::Axis;
    use crate::engine_state::voxels::block::block_type::BlockType;

    fn edited_chunk(position: ChunkCoordinate) -> Chunk {
        let mut chunk = Chunk::empty(position);
        chunk.set_block(Point3::new(0, 0, 0), Block::new(BlockType::STONE));
        chunk.set_block(
            Point3::new(4, 9, 2),
            Block::new(BlockType::LOG).with_axis(Axis::X),
        );
        chunk.set_block(
            Point3::new(15, 15, 15),
            Block {
                block_type: BlockType::DIRT as u8,
                metadata: 0xA0,
            },
        );
        chunk
    }

    #[test]
    fn chunk_file_preserves_blocks_metadata_and_version() {
        let chunk = edited_chunk(Point3::new(-3, 1, 40));
        let decoded = decode_chunk(&encode_chunk(&chunk), chunk.position).unwrap();

        assert_eq!(decoded.blocks(), chunk.blocks());
        assert_eq!(decoded.version(), 3);
        assert!(decoded.is_edited());
        assert_eq!(decoded.get_block(Point3::new(4, 9, 2)).axis(), Axis::X);
        assert_eq!(decoded.get_block(Point3::new(15, 15, 15)).light(), 0xA);
    }

    #[test]
    fn uniform_chunk_encodes_as_single_runs() {
        let chunk = Chunk::from_blocks(
            Point3::new(0, 0, 0),
            vec![Block::new(BlockType::STONE); CHUNK_SIZE as usize],
        )
        .unwrap();
        let bytes = encode_chunk(&chunk);
        // 4096 fits in one run for each stream, plus a terminator each.
        assert_eq!(bytes.len(), HEADER_LEN + 2 * (3 + 3));
        assert_eq!(decode_chunk(&bytes, chunk.position).unwrap().blocks(), chunk.blocks());
    }

    #[test]
    fn corrupt_files_are_rejected() {
        let chunk = edited_chunk(Point3::new(0, 0, 0));
        let bytes = encode_chunk(&chunk);

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            decode_chunk(&bad_magic, chunk.position),
            Err(StorageError::BadMagic)
        ));

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(matches!(
            decode_chunk(&bad_version, chunk.position),
            Err(StorageError::UnsupportedVersion { found: 9, .. })
        ));

        assert!(matches!(
            decode_chunk(&bytes[..bytes.len() - 4], chunk.position),
            Err(StorageError::Corrupt(_))
        ));

        assert!(matches!(
            decode_chunk(&bytes, Point3::new(1, 0, 0)),
            Err(StorageError::CoordinateMismatch { .. })
        ));

        let mut overlong = bytes[..HEADER_LEN].to_vec();
        push_run(&mut overlong, 1, MAX_RUN);
        push_run(&mut overlong, 1, 10);
        push_run(&mut overlong, 0, 0);
        assert!(matches!(
            decode_chunk(&overlong, chunk.position),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn regions_use_floor_division() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path(), 4, true).unwrap();
        assert_eq!(
            store.chunk_path(Point3::new(-1, 31, 32)),
            dir.path().join("region_-1_0_1").join("chunk_-1_31_32.bin")
        );
    }

    #[test]
    fn stash_evicts_to_disk_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChunkStore::open(dir.path(), 2, true).unwrap();

        for x in 0..3 {
            store.stash(edited_chunk(Point3::new(x, 0, 0))).unwrap();
        }
        assert_eq!(store.stashed_count(), 2);
        assert!(store.chunk_path(Point3::new(0, 0, 0)).exists());
        assert!(!store.chunk_path(Point3::new(2, 0, 0)).exists());

        let from_disk = store.read(Point3::new(0, 0, 0)).unwrap().unwrap();
        assert_eq!(from_disk.blocks(), edited_chunk(Point3::new(0, 0, 0)).blocks());
        assert!(store.unstash(Point3::new(0, 0, 0)).is_none());

        // Stashed chunks are invisible to disk reads until written.
        assert!(store.read(Point3::new(2, 0, 0)).unwrap().is_none());
        let from_stash = store.unstash(Point3::new(2, 0, 0)).unwrap();
        assert_eq!(from_stash.version(), 3);
        assert_eq!(store.stashed_count(), 1);

        assert!(store.read(Point3::new(9, 9, 9)).unwrap().is_none());
    }

    #[test]
    fn flush_writes_every_stashed_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChunkStore::open(dir.path(), 8, true).unwrap();
        store.stash(edited_chunk(Point3::new(0, 0, 0))).unwrap();
        store.stash(edited_chunk(Point3::new(0, -1, 0))).unwrap();

        assert_eq!(store.flush(), 2);
        assert_eq!(store.stashed_count(), 0);

        let reopened = ChunkStore::open(dir.path(), 8, true).unwrap();
        assert!(reopened.read(Point3::new(0, -1, 0)).unwrap().is_some());
        assert!(!dir
            .path()
            .join("region_0_-1_0")
            .join("chunk_0_-1_0.bin.tmp")
            .exists());
    }

    #[test]
    fn saved_seed_wins_over_configured_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path(), 1, true).unwrap();
        let created = store.load_or_create_metadata(Some(42)).unwrap();
        assert_eq!(created.seed, 42);

        let reopened = ChunkStore::open(dir.path(), 1, true).unwrap();
        assert_eq!(reopened.load_or_create_metadata(Some(7)).unwrap().seed, 42);
    }

    #[test]
    fn disabled_persistence_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("world");
        let mut store = ChunkStore::open(&root, 1, false).unwrap();
        store.stash(edited_chunk(Point3::new(0, 0, 0))).unwrap();
        store.stash(edited_chunk(Point3::new(1, 0, 0))).unwrap();
        store.flush();
        store.load_or_create_metadata(None).unwrap();
        assert!(!root.exists());
    }
}
