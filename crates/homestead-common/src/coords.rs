//! Coordinate types for tiles and chunks.
//!
//! Tiles are addressed by absolute integer world coordinates. Chunks are the
//! square regions of `chunk_size` tiles per edge that tiles are grouped into.
//! All conversions use floor division so that negative coordinates map to the
//! chunk on their "left", never toward zero.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Absolute tile coordinate in world space.
///
/// Used directly as the sparse-map key, so distinct coordinates can never
/// collide regardless of magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// X coordinate in tiles
    pub x: i32,
    /// Y coordinate in tiles
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Floors a continuous position to the tile containing it.
    ///
    /// Values beyond the `i32` range saturate; NaN maps to zero.
    #[must_use]
    pub fn from_position(x: f32, y: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Converts to the coordinate of the chunk containing this tile.
    #[must_use]
    pub const fn to_chunk_coord(self, chunk_size: u32) -> ChunkCoord {
        let size = chunk_size as i64;
        ChunkCoord {
            x: (self.x as i64).div_euclid(size) as i32,
            y: (self.y as i64).div_euclid(size) as i32,
        }
    }

    /// Offset of this tile inside its chunk, both axes in `0..chunk_size`.
    #[must_use]
    pub const fn to_local(self, chunk_size: u32) -> (u32, u32) {
        let size = chunk_size as i64;
        (
            (self.x as i64).rem_euclid(size) as u32,
            (self.y as i64).rem_euclid(size) as u32,
        )
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile at the minimum corner of this chunk.
    #[must_use]
    pub const fn origin_tile(self, chunk_size: u32) -> TileCoord {
        let size = chunk_size as i64;
        TileCoord {
            x: (self.x as i64 * size) as i32,
            y: (self.y as i64 * size) as i32,
        }
    }

    /// Checks whether a tile lies inside this chunk.
    #[must_use]
    pub const fn contains(self, tile: TileCoord, chunk_size: u32) -> bool {
        let c = tile.to_chunk_coord(chunk_size);
        c.x == self.x && c.y == self.y
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Anything that can be resolved to a single tile.
///
/// Continuous positions are floored on their first two axes; a [`TileCoord`]
/// passes through unchanged, which is how callers supply an explicit tile.
pub trait Locate {
    /// Returns the tile this value refers to.
    fn tile(&self) -> TileCoord;
}

impl Locate for TileCoord {
    fn tile(&self) -> TileCoord {
        *self
    }
}

impl Locate for (i32, i32) {
    fn tile(&self) -> TileCoord {
        TileCoord::new(self.0, self.1)
    }
}

impl Locate for Vec2 {
    fn tile(&self) -> TileCoord {
        TileCoord::from_position(self.x, self.y)
    }
}

impl Locate for Vec3 {
    fn tile(&self) -> TileCoord {
        TileCoord::from_position(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_negative_tiles_floor_to_lower_chunk() {
        assert_eq!(TileCoord::new(-1, -1).to_chunk_coord(16), ChunkCoord::new(-1, -1));
        assert_eq!(TileCoord::new(-16, 0).to_chunk_coord(16), ChunkCoord::new(-1, 0));
        assert_eq!(TileCoord::new(-17, 15).to_chunk_coord(16), ChunkCoord::new(-2, 0));
        assert_eq!(TileCoord::new(16, 31).to_chunk_coord(16), ChunkCoord::new(1, 1));
    }

    #[test]
    fn test_local_offsets() {
        assert_eq!(TileCoord::new(-1, 17).to_local(16), (15, 1));
        assert_eq!(TileCoord::new(0, 0).to_local(16), (0, 0));
    }

    #[test]
    fn test_position_floors() {
        assert_eq!(Vec2::new(5.9, 5.1).tile(), TileCoord::new(5, 5));
        assert_eq!(Vec2::new(-0.5, -1.0).tile(), TileCoord::new(-1, -1));
        assert_eq!(Vec3::new(2.5, -3.2, 99.0).tile(), TileCoord::new(2, -4));
        assert_eq!((7, -7).tile(), TileCoord::new(7, -7));
    }

    #[test]
    fn test_chunk_origin_and_contains() {
        let chunk = ChunkCoord::new(-2, 3);
        let origin = chunk.origin_tile(16);
        assert_eq!(origin, TileCoord::new(-32, 48));
        assert!(chunk.contains(origin, 16));
        assert!(chunk.contains(TileCoord::new(-17, 63), 16));
        assert!(!chunk.contains(TileCoord::new(-16, 48), 16));
    }

    #[test]
    fn test_keys_that_collide_under_decimal_packing_stay_distinct() {
        // x * 100000 + y maps each of these pairs onto one integer.
        let packed_collisions = [
            (TileCoord::new(1, 0), TileCoord::new(0, 100_000)),
            (TileCoord::new(10_000, 5), TileCoord::new(9_999, 100_005)),
            (TileCoord::new(-10_000, 0), TileCoord::new(-10_001, 100_000)),
        ];
        for (a, b) in packed_collisions {
            assert_eq!(
                i64::from(a.x) * 100_000 + i64::from(a.y),
                i64::from(b.x) * 100_000 + i64::from(b.y)
            );
            assert_ne!(a, b);
        }

        let mut seen = HashSet::new();
        for x in -10_002..=-9_998 {
            for y in [-100_001, -1, 0, 1, 99_999, 100_000] {
                assert!(seen.insert(TileCoord::new(x, y)));
            }
        }
        for x in 9_998..=10_002 {
            for y in [-100_001, -1, 0, 1, 99_999, 100_000] {
                assert!(seen.insert(TileCoord::new(x, y)));
            }
        }
        assert_eq!(seen.len(), 60);
    }

    proptest::proptest! {
        #[test]
        fn prop_tile_round_trips_through_chunk_and_local(
            x in -1_000_000i32..1_000_000,
            y in -1_000_000i32..1_000_000,
            size in 1u32..128,
        ) {
            let tile = TileCoord::new(x, y);
            let chunk = tile.to_chunk_coord(size);
            let (lx, ly) = tile.to_local(size);
            let origin = chunk.origin_tile(size);
            proptest::prop_assert!(lx < size && ly < size);
            proptest::prop_assert_eq!(origin.x + lx as i32, x);
            proptest::prop_assert_eq!(origin.y + ly as i32, y);
        }
    }
}
