//! Eagerly allocated chunk storage, one map per section.

use std::collections::BTreeMap;

use ahash::AHashMap;
use homestead_common::{ChunkCoord, SectionId};
use tracing::debug;

use crate::chunk::Chunk;
use crate::section::SectionRegistry;

/// Owns every chunk of every active section.
///
/// Chunks are created up front and live until the store is dropped; only
/// the tiles inside them come and go.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    sections: BTreeMap<SectionId, AHashMap<ChunkCoord, Chunk>>,
}

impl ChunkStore {
    /// Allocates one empty chunk per coordinate of each active section.
    #[must_use]
    pub fn new(registry: &SectionRegistry) -> Self {
        let size = registry.chunk_size();
        let mut sections = BTreeMap::new();
        for config in registry.active() {
            let chunks: AHashMap<ChunkCoord, Chunk> = config
                .chunk_coords()
                .map(|coord| (coord, Chunk::new(coord, config.id, size)))
                .collect();
            debug!("Allocated {} chunks for {} ({})", chunks.len(), config.id, config.name);
            sections.insert(config.id, chunks);
        }
        Self { sections }
    }

    /// Looks up a chunk.
    #[must_use]
    pub fn get(&self, section: SectionId, coord: ChunkCoord) -> Option<&Chunk> {
        self.sections.get(&section)?.get(&coord)
    }

    /// Looks up a chunk mutably.
    pub fn get_mut(&mut self, section: SectionId, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.sections.get_mut(&section)?.get_mut(&coord)
    }

    /// Ids of sections that own chunks.
    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.keys().copied()
    }

    /// Chunks of one section, in no particular order.
    pub fn section_chunks(&self, section: SectionId) -> impl Iterator<Item = &Chunk> {
        self.sections.get(&section).into_iter().flat_map(|chunks| chunks.values())
    }

    /// Every chunk.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.sections.values().flat_map(|chunks| chunks.values())
    }

    /// Every chunk, mutably.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.sections.values_mut().flat_map(|chunks| chunks.values_mut())
    }

    /// Number of sections with chunks.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.sections.values().map(|chunks| chunks.len()).sum()
    }

    /// Empties every chunk without deallocating any.
    pub fn clear_all(&mut self) {
        for chunk in self.chunks_mut() {
            chunk.clear();
        }
    }
}
