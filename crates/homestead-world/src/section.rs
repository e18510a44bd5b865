//! Section configuration and position resolution.

use homestead_common::{ChunkCoord, Locate, SectionId, TileCoord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Section registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    /// Chunk size of zero
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,
    /// A full chunk would hold more tiles than one record count can describe
    #[error("chunk size {0} exceeds {} tiles per chunk", MAX_CHUNK_TILES)]
    ChunkTooLarge(u32),
    /// A section covers no chunks
    #[error("{0} has zero width or height")]
    Empty(SectionId),
    /// A section extends past the `i32` chunk grid
    #[error("{0} extends past the chunk grid")]
    OutOfRange(SectionId),
    /// Two sections share an id
    #[error("{0} is declared twice")]
    DuplicateId(SectionId),
    /// Two active sections cover the same chunk
    #[error("active sections {0} and {1} overlap")]
    Overlap(SectionId, SectionId),
}

/// Most tiles one chunk may hold; the chunk format counts records in a `u16`.
pub const MAX_CHUNK_TILES: u64 = u16::MAX as u64;

/// Rectangular region of chunks forming one playable area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Unique id
    pub id: SectionId,
    /// Display name
    pub name: String,
    /// First chunk column
    pub chunk_start_x: i32,
    /// First chunk row
    pub chunk_start_y: i32,
    /// Width in chunks
    pub chunks_width: u32,
    /// Height in chunks
    pub chunks_height: u32,
    /// Inactive sections own no chunks and resolve no positions
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl SectionConfig {
    /// Creates an active section.
    #[must_use]
    pub fn new(
        id: SectionId,
        name: impl Into<String>,
        start: ChunkCoord,
        chunks_width: u32,
        chunks_height: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            chunk_start_x: start.x,
            chunk_start_y: start.y,
            chunks_width,
            chunks_height,
            active: true,
        }
    }

    /// Marks the section inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Checks whether a chunk lies inside `[start, start + size)` on both axes.
    #[must_use]
    pub fn contains_chunk(&self, chunk: ChunkCoord) -> bool {
        let (x, y) = (i64::from(chunk.x), i64::from(chunk.y));
        let (sx, sy) = (i64::from(self.chunk_start_x), i64::from(self.chunk_start_y));
        x >= sx
            && x < sx + i64::from(self.chunks_width)
            && y >= sy
            && y < sy + i64::from(self.chunks_height)
    }

    /// Every chunk coordinate inside the section, row by row.
    pub fn chunk_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        (0..self.chunks_height).flat_map(move |dy| {
            (0..self.chunks_width).map(move |dx| {
                ChunkCoord::new(
                    self.chunk_start_x.saturating_add_unsigned(dx),
                    self.chunk_start_y.saturating_add_unsigned(dy),
                )
            })
        })
    }

    /// Number of chunks in the section.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks_width as usize * self.chunks_height as usize
    }

    fn fits_grid(&self) -> bool {
        let last = |start: i32, len: u32| i64::from(start) + i64::from(len) - 1;
        last(self.chunk_start_x, self.chunks_width) <= i64::from(i32::MAX)
            && last(self.chunk_start_y, self.chunks_height) <= i64::from(i32::MAX)
    }

    fn overlaps(&self, other: &Self) -> bool {
        let span = |start: i32, len: u32| (i64::from(start), i64::from(start) + i64::from(len));
        let (ax0, ax1) = span(self.chunk_start_x, self.chunks_width);
        let (ay0, ay1) = span(self.chunk_start_y, self.chunks_height);
        let (bx0, bx1) = span(other.chunk_start_x, other.chunks_width);
        let (by0, by1) = span(other.chunk_start_y, other.chunks_height);
        ax0 < bx1 && bx0 < ax1 && ay0 < by1 && by0 < ay1
    }
}

/// Validated, read-only set of sections plus the chunk size they share.
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    chunk_size: u32,
    sections: Vec<SectionConfig>,
}

impl SectionRegistry {
    /// Validates and wraps a section list.
    pub fn new(chunk_size: u32, sections: Vec<SectionConfig>) -> Result<Self, SectionError> {
        if chunk_size == 0 {
            return Err(SectionError::ZeroChunkSize);
        }
        if u64::from(chunk_size) * u64::from(chunk_size) > MAX_CHUNK_TILES {
            return Err(SectionError::ChunkTooLarge(chunk_size));
        }
        for (i, section) in sections.iter().enumerate() {
            if section.chunks_width == 0 || section.chunks_height == 0 {
                return Err(SectionError::Empty(section.id));
            }
            if !section.fits_grid() {
                return Err(SectionError::OutOfRange(section.id));
            }
            for other in &sections[..i] {
                if other.id == section.id {
                    return Err(SectionError::DuplicateId(section.id));
                }
                if other.active && section.active && other.overlaps(section) {
                    return Err(SectionError::Overlap(other.id, section.id));
                }
            }
        }
        Ok(Self {
            chunk_size,
            sections,
        })
    }

    /// Tiles per chunk edge.
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Converts a tile to the chunk containing it.
    #[must_use]
    pub const fn world_to_chunk(&self, tile: TileCoord) -> ChunkCoord {
        tile.to_chunk_coord(self.chunk_size)
    }

    /// Finds the active section containing `at`.
    ///
    /// `None` is an ordinary outcome for positions off every farm map.
    #[must_use]
    pub fn section_for(&self, at: &impl Locate) -> Option<SectionId> {
        let chunk = self.world_to_chunk(at.tile());
        self.active()
            .find(|s| s.contains_chunk(chunk))
            .map(|s| s.id)
    }

    /// Looks up a section by id, active or not.
    #[must_use]
    pub fn get(&self, id: SectionId) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Active sections in declaration order.
    pub fn active(&self) -> impl Iterator<Item = &SectionConfig> {
        self.sections.iter().filter(|s| s.active)
    }

    /// Every declared section.
    #[must_use]
    pub fn all(&self) -> &[SectionConfig] {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn farm(id: i32, x: i32, y: i32, w: u32, h: u32) -> SectionConfig {
        SectionConfig::new(SectionId::new(id), format!("farm {id}"), ChunkCoord::new(x, y), w, h)
    }

    #[test]
    fn test_section_bounds_are_half_open() {
        let s = farm(1, -2, 0, 3, 2);
        assert!(s.contains_chunk(ChunkCoord::new(-2, 0)));
        assert!(s.contains_chunk(ChunkCoord::new(0, 1)));
        assert!(!s.contains_chunk(ChunkCoord::new(1, 0)));
        assert!(!s.contains_chunk(ChunkCoord::new(0, 2)));
        assert!(!s.contains_chunk(ChunkCoord::new(-3, 0)));
        assert_eq!(s.chunk_coords().count(), 6);
        assert_eq!(s.chunk_count(), 6);
    }

    #[test]
    fn test_resolution_uses_floor() {
        let reg = SectionRegistry::new(16, vec![farm(1, 0, 0, 2, 2), farm(2, -1, 0, 1, 1)])
            .expect("valid");
        assert_eq!(reg.section_for(&Vec2::new(0.5, 0.5)), Some(SectionId::new(1)));
        assert_eq!(reg.section_for(&Vec2::new(-0.5, 3.0)), Some(SectionId::new(2)));
        assert_eq!(reg.section_for(&TileCoord::new(31, 31)), Some(SectionId::new(1)));
        assert_eq!(reg.section_for(&TileCoord::new(32, 0)), None);
        assert_eq!(reg.section_for(&TileCoord::new(-1, -1)), None);
    }

    #[test]
    fn test_inactive_sections_resolve_nothing() {
        let reg = SectionRegistry::new(16, vec![farm(1, 0, 0, 1, 1).inactive()]).expect("valid");
        assert_eq!(reg.section_for(&TileCoord::new(1, 1)), None);
        assert!(reg.get(SectionId::new(1)).is_some());
        assert_eq!(reg.active().count(), 0);
    }

    #[test]
    fn test_invalid_registries_are_rejected() {
        assert_eq!(
            SectionRegistry::new(0, vec![]).err(),
            Some(SectionError::ZeroChunkSize)
        );
        assert_eq!(
            SectionRegistry::new(16, vec![farm(1, 0, 0, 0, 4)]).err(),
            Some(SectionError::Empty(SectionId::new(1)))
        );
        assert_eq!(
            SectionRegistry::new(16, vec![farm(1, 0, 0, 1, 1), farm(1, 5, 5, 1, 1)]).err(),
            Some(SectionError::DuplicateId(SectionId::new(1)))
        );
        assert_eq!(
            SectionRegistry::new(16, vec![farm(1, 0, 0, 4, 4), farm(2, 3, 3, 2, 2)]).err(),
            Some(SectionError::Overlap(SectionId::new(1), SectionId::new(2)))
        );
    }

    #[test]
    fn test_chunk_size_bounded_by_record_count() {
        assert!(SectionRegistry::new(255, vec![farm(1, 0, 0, 1, 1)]).is_ok());
        assert_eq!(
            SectionRegistry::new(256, vec![farm(1, 0, 0, 1, 1)]).err(),
            Some(SectionError::ChunkTooLarge(256))
        );
    }

    #[test]
    fn test_sections_past_grid_edge_are_rejected() {
        let edge = farm(1, i32::MAX - 1, 0, 2, 1);
        let reg = SectionRegistry::new(16, vec![edge.clone()]).expect("fits exactly");
        assert_eq!(reg.all()[0].chunk_coords().count(), edge.chunk_count());

        assert_eq!(
            SectionRegistry::new(16, vec![farm(2, i32::MAX - 1, 0, 3, 1)]).err(),
            Some(SectionError::OutOfRange(SectionId::new(2)))
        );
        assert_eq!(
            SectionRegistry::new(16, vec![farm(3, 0, i32::MAX, 1, 2)]).err(),
            Some(SectionError::OutOfRange(SectionId::new(3)))
        );
    }

    #[test]
    fn test_inactive_sections_may_overlap() {
        let reg = SectionRegistry::new(
            16,
            vec![farm(1, 0, 0, 4, 4), farm(2, 3, 3, 2, 2).inactive()],
        );
        assert!(reg.is_ok());
    }

    #[test]
    fn test_adjacent_sections_do_not_overlap() {
        let reg = SectionRegistry::new(16, vec![farm(1, 0, 0, 2, 2), farm(2, 2, 0, 2, 2)])
            .expect("valid");
        assert_eq!(reg.section_for(&TileCoord::new(31, 0)), Some(SectionId::new(1)));
        assert_eq!(reg.section_for(&TileCoord::new(32, 0)), Some(SectionId::new(2)));
    }
}
