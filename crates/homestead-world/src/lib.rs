//! # Homestead World
//!
//! Farm tile state for Homestead.
//!
//! This crate handles:
//! - Sparse per-chunk tile records (tillage, crops, structures, pollination)
//! - Section layout and world-position routing
//! - The binary chunk format, legacy and extended
//! - Chunk files on disk and paced saving

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod codec;
pub mod config;
pub mod crops;
pub mod persistence;
pub mod section;
pub mod stats;
pub mod store;
pub mod structures;
pub mod tile;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::chunk::*;
    pub use crate::codec::*;
    pub use crate::config::*;
    pub use crate::persistence::*;
    pub use crate::section::*;
    pub use crate::stats::*;
    pub use crate::store::*;
    pub use crate::tile::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_common::{ChunkCoord, CropTypeId, SectionId, TileCoord};

    #[test]
    fn test_chunk_creation() {
        let coord = ChunkCoord::new(0, 0);
        let chunk = Chunk::new(coord, SectionId::new(0), 16);
        assert_eq!(chunk.coord(), coord);
        assert!(!chunk.is_dirty());
        assert!(!chunk.is_loaded());
    }

    #[test]
    fn test_world_from_default_config() {
        let mut world = FarmWorld::from_config(&WorldConfig::default()).expect("default layout");
        assert_eq!(world.stats().total_chunks, 16);

        world.till((10, 40)).expect("till");
        world.plant_crop((10, 40), CropTypeId::new(4)).expect("plant");

        let key = world.resolve(&TileCoord::new(10, 40)).expect("resolved");
        let chunk = world.chunk_by_key(key).expect("allocated");
        let bytes = chunk.encode(ChunkFormat::default()).expect("encode");
        let copy = Chunk::from_bytes(&bytes, 16).expect("decode");
        assert_eq!(copy.crops(), chunk.crops());
    }
}
