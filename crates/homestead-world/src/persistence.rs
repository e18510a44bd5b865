//! Chunk files on disk and the paced save sweep.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use homestead_common::{ChunkCoord, SectionId};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::chunk::Chunk;
use crate::codec::{ChunkFormat, CodecError};
use crate::world::{ChunkKey, FarmWorld};

/// File extension of chunk files.
pub const CHUNK_FILE_EXTENSION: &str = "hstl";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// Stored bytes could not be encoded or decoded
    #[error("chunk file {}: {source}", path.display())]
    Codec {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: CodecError,
    },
    /// The chunk holds state the target format cannot store
    #[error("chunk file {}: {format:?} format would drop structures or pollination", path.display())]
    Lossy {
        /// File that was not written
        path: PathBuf,
        /// Format that was refused
        format: ChunkFormat,
    },
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Outcome of loading every chunk of a world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Chunks read from a file
    pub loaded: usize,
    /// Chunks with no file yet
    pub fresh: usize,
    /// Chunks whose file was unreadable or corrupt
    pub failed: usize,
}

/// Reads and writes chunk files under one directory.
///
/// Layout: `<save_dir>/section_<id>/chunk_<x>_<y>.hstl`.
#[derive(Debug, Clone)]
pub struct ChunkPersistence {
    save_dir: PathBuf,
    format: ChunkFormat,
    allow_lossy: bool,
}

impl ChunkPersistence {
    /// Creates a persistence layer writing `format`.
    #[must_use]
    pub fn new(save_dir: impl Into<PathBuf>, format: ChunkFormat) -> Self {
        Self {
            save_dir: save_dir.into(),
            format,
            allow_lossy: false,
        }
    }

    /// Lets legacy saves drop structures and pollination state instead of
    /// refusing the write.
    #[must_use]
    pub fn allow_lossy(mut self, allow: bool) -> Self {
        self.allow_lossy = allow;
        self
    }

    /// Root directory.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Returns the file path for a chunk.
    #[must_use]
    pub fn chunk_path(&self, section: SectionId, coord: ChunkCoord) -> PathBuf {
        self.save_dir
            .join(format!("section_{}", section.raw()))
            .join(format!("chunk_{}_{}.{CHUNK_FILE_EXTENSION}", coord.x, coord.y))
    }

    /// Writes a chunk and marks it clean.
    ///
    /// A legacy write that would lose state fails with
    /// [`PersistenceError::Lossy`] and leaves the chunk dirty, unless
    /// [`ChunkPersistence::allow_lossy`] is set.
    pub fn save_chunk(&self, chunk: &mut Chunk) -> PersistenceResult<()> {
        let path = self.chunk_path(chunk.section(), chunk.coord());
        if self.format == ChunkFormat::Legacy && !chunk.fits_legacy() {
            if !self.allow_lossy {
                return Err(PersistenceError::Lossy {
                    path,
                    format: self.format,
                });
            }
            warn!(
                "Chunk {} of {} saved as legacy; structures and pollination dropped",
                chunk.coord(),
                chunk.section()
            );
        }
        let bytes = chunk.encode(self.format).map_err(|source| PersistenceError::Codec {
            path: path.clone(),
            source,
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // Readers only ever see a complete file.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistenceError::Io {
            path: path.clone(),
            source,
        })?;

        chunk.mark_clean();
        debug!("Saved chunk {} of {} ({} bytes)", chunk.coord(), chunk.section(), bytes.len());
        Ok(())
    }

    /// Reads a chunk's file into it.
    ///
    /// Returns `Ok(false)` when no file exists, in which case the chunk is
    /// marked loaded as-is. On error the chunk keeps its prior state.
    pub fn load_chunk(&self, chunk: &mut Chunk) -> PersistenceResult<bool> {
        let path = self.chunk_path(chunk.section(), chunk.coord());
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                chunk.mark_loaded();
                return Ok(false);
            },
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };
        chunk
            .decode(&bytes)
            .map_err(|source| PersistenceError::Codec { path, source })?;
        Ok(true)
    }

    /// Loads every chunk of a world, skipping files that fail.
    pub fn load_all(&self, world: &mut FarmWorld) -> LoadReport {
        let mut report = LoadReport::default();
        for chunk in world.store_mut().chunks_mut() {
            match self.load_chunk(chunk) {
                Ok(true) => report.loaded += 1,
                Ok(false) => report.fresh += 1,
                Err(e) => {
                    error!("Failed to load chunk {} of {}: {e}", chunk.coord(), chunk.section());
                    report.failed += 1;
                },
            }
        }
        info!(
            "Loaded {} chunks from {} ({} fresh, {} failed)",
            report.loaded,
            self.save_dir.display(),
            report.fresh,
            report.failed
        );
        report
    }

    /// Saves every dirty chunk at once. Returns the number written.
    ///
    /// Blocks until done; prefer [`SaveSweep`] on the simulation loop.
    pub fn save_all(&self, world: &mut FarmWorld) -> usize {
        let mut saved = 0;
        for chunk in world.store_mut().chunks_mut().filter(|c| c.is_dirty()) {
            if let Err(e) = self.save_chunk(chunk) {
                warn!("Failed to save chunk {} of {}: {e}", chunk.coord(), chunk.section());
            } else {
                saved += 1;
            }
        }
        info!("Saved {saved} chunks");
        saved
    }
}

/// Saves dirty chunks a few at a time across simulation ticks.
///
/// Each pass snapshots the dirty set, then drains it at most `budget`
/// chunks per [`SaveSweep::tick`]. A chunk dirtied again after being
/// written is picked up by the next pass.
#[derive(Debug, Clone)]
pub struct SaveSweep {
    budget: usize,
    pending: VecDeque<ChunkKey>,
}

impl SaveSweep {
    /// Creates a sweep writing at most `budget` chunks per tick.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            pending: VecDeque::new(),
        }
    }

    /// Chunks still queued in the current pass.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Checks whether no pass is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advances the sweep by one tick. Returns the number of chunks written.
    pub fn tick(&mut self, world: &mut FarmWorld, persistence: &ChunkPersistence) -> usize {
        if self.pending.is_empty() {
            self.pending.extend(world.dirty_chunks());
            if self.pending.is_empty() {
                return 0;
            }
            debug!("Save sweep started with {} dirty chunks", self.pending.len());
        }

        let mut saved = 0;
        for _ in 0..self.budget {
            let Some(key) = self.pending.pop_front() else {
                break;
            };
            let Some(chunk) = world.chunk_by_key_mut(key) else {
                continue;
            };
            if !chunk.is_dirty() {
                continue;
            }
            match persistence.save_chunk(chunk) {
                Ok(()) => saved += 1,
                Err(e) => warn!("Failed to save chunk {} of {}: {e}", key.chunk, key.section),
            }
        }
        saved
    }

    /// Ticks until the current pass is drained.
    pub fn finish(&mut self, world: &mut FarmWorld, persistence: &ChunkPersistence) -> usize {
        let mut saved = self.tick(world, persistence);
        while !self.is_idle() {
            saved += self.tick(world, persistence);
        }
        saved
    }
}
