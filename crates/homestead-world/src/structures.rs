//! Structure operations on [`FarmWorld`].

use homestead_common::{Locate, StructureId, WorldResult};

use crate::chunk::Chunk;
use crate::tile::TileState;
use crate::world::FarmWorld;

impl FarmWorld {
    /// Places a structure on a tile with no crop and no structure.
    pub fn place_structure(&mut self, at: impl Locate, structure: StructureId) -> WorldResult<()> {
        self.mutate(&at, |chunk, tile| chunk.place_structure(structure, tile))
    }

    /// Removes the structure at a position.
    pub fn remove_structure(&mut self, at: impl Locate) -> WorldResult<()> {
        self.mutate(&at, Chunk::remove_structure)
    }

    /// Checks whether a structure stands at a position.
    pub fn has_structure(&self, at: impl Locate) -> WorldResult<bool> {
        self.query(&at, Chunk::has_structure)
    }

    /// Copy of the structure record at a position.
    pub fn structure_at(&self, at: impl Locate) -> WorldResult<Option<TileState>> {
        self.query(&at, Chunk::structure_at)
    }

    /// Snapshot of every structure in every section.
    #[must_use]
    pub fn all_structures(&self) -> Vec<TileState> {
        self.store().chunks().flat_map(Chunk::structures).collect()
    }
}
