//! Error types shared by the Homestead crates.

use thiserror::Error;

use crate::coords::{ChunkCoord, TileCoord};
use crate::ids::SectionId;

/// A tile mutation refused because it would break a farming rule.
///
/// These are ordinary outcomes (a tool used on the wrong tile) and leave the
/// tile untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileRejection {
    /// Tile is already tilled
    #[error("tile is already tilled")]
    AlreadyTilled,
    /// Tile is not tilled
    #[error("tile is not tilled")]
    NotTilled,
    /// No record exists for the tile
    #[error("tile has no state")]
    NoTile,
    /// A crop already occupies the tile
    #[error("tile already has a crop")]
    CropPresent,
    /// No crop on the tile
    #[error("tile has no crop")]
    NoCrop,
    /// A structure already occupies the tile
    #[error("tile already has a structure")]
    StructurePresent,
    /// No structure on the tile
    #[error("tile has no structure")]
    NoStructure,
    /// Tile does not belong to the chunk it was sent to
    #[error("tile {0} lies outside this chunk")]
    OutsideChunk(TileCoord),
}

/// Failures reported by the world-position API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldDataError {
    /// Position lies in no active section
    #[error("tile {0} is not inside any active section")]
    Unresolved(TileCoord),

    /// Resolved chunk was never allocated
    #[error("no chunk {chunk} allocated in {section}")]
    ChunkMissing {
        /// Section the position resolved to
        section: SectionId,
        /// Chunk coordinate that was looked up
        chunk: ChunkCoord,
    },

    /// The chunk refused the mutation
    #[error(transparent)]
    Rejected(#[from] TileRejection),
}

impl WorldDataError {
    /// Checks whether this is an ordinary rule rejection rather than a
    /// resolution failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type for tile-level mutations.
pub type TileResult<T> = Result<T, TileRejection>;

/// Result type for world-position operations.
pub type WorldResult<T> = Result<T, WorldDataError>;
