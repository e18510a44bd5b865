//! Aggregate diagnostics over every section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::ChunkStore;

/// Rough cost of one stored tile record (entry, hash slot, padding).
pub const BYTES_PER_TILE_ESTIMATE: usize = 48;

/// Rough fixed cost of one chunk object.
pub const BYTES_PER_CHUNK_ESTIMATE: usize = 128;

/// Rough fixed cost of one section map.
pub const BYTES_PER_SECTION_ESTIMATE: usize = 4 * 1024;

/// Totals over the whole store.
///
/// `memory_usage_mb` is an estimate built from the per-record and
/// per-container constants in this module, not an allocator measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldStats {
    /// Allocated chunks
    pub total_chunks: usize,
    /// Chunks whose persisted state has been applied
    pub loaded_chunks: usize,
    /// Chunks with unsaved changes
    pub dirty_chunks: usize,
    /// Stored tile records
    pub total_tiles: usize,
    /// Tilled tiles
    pub total_tilled_tiles: usize,
    /// Tiles with a crop
    pub total_crops: usize,
    /// Chunks holding at least one crop
    pub chunks_with_crops: usize,
    /// Tiles with a structure
    pub total_structures: usize,
    /// Chunks holding at least one structure
    pub chunks_with_structures: usize,
    /// Estimated footprint in MiB
    pub memory_usage_mb: f64,
}

impl WorldStats {
    /// Walks every chunk of every section.
    #[must_use]
    pub fn collect(store: &ChunkStore) -> Self {
        let mut stats = Self::default();
        for chunk in store.chunks() {
            let counts = chunk.counts();
            stats.total_chunks += 1;
            stats.loaded_chunks += usize::from(chunk.is_loaded());
            stats.dirty_chunks += usize::from(chunk.is_dirty());
            stats.total_tiles += chunk.tile_count();
            stats.total_tilled_tiles += counts.tilled;
            stats.total_crops += counts.crops;
            stats.chunks_with_crops += usize::from(counts.crops > 0);
            stats.total_structures += counts.structures;
            stats.chunks_with_structures += usize::from(counts.structures > 0);
        }

        let bytes = stats.total_tiles * BYTES_PER_TILE_ESTIMATE
            + stats.total_chunks * BYTES_PER_CHUNK_ESTIMATE
            + store.section_count() * BYTES_PER_SECTION_ESTIMATE;
        stats.memory_usage_mb = bytes as f64 / (1024.0 * 1024.0);
        stats
    }

    /// String-keyed view for inspectors and log sinks.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("TotalChunks", self.total_chunks as f64),
            ("LoadedChunks", self.loaded_chunks as f64),
            ("TotalCrops", self.total_crops as f64),
            ("TotalTilledTiles", self.total_tilled_tiles as f64),
            ("ChunksWithCrops", self.chunks_with_crops as f64),
            ("MemoryUsageMB", self.memory_usage_mb),
            ("TotalStructures", self.total_structures as f64),
            ("ChunksWithStructures", self.chunks_with_structures as f64),
            ("DirtyChunks", self.dirty_chunks as f64),
        ])
    }
}

impl std::fmt::Display for WorldStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} chunks ({} loaded, {} dirty), {} tilled, {} crops in {} chunks, \
             {} structures in {} chunks, ~{:.3} MB",
            self.total_chunks,
            self.loaded_chunks,
            self.dirty_chunks,
            self.total_tilled_tiles,
            self.total_crops,
            self.chunks_with_crops,
            self.total_structures,
            self.chunks_with_structures,
            self.memory_usage_mb,
        )
    }
}
