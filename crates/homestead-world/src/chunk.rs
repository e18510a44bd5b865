//! Sparse tile storage for one chunk.

use ahash::AHashMap;
use homestead_common::{
    ChunkCoord, CropTypeId, SectionId, StructureId, TileCoord, TileRejection, TileResult,
};
use tracing::trace;

use crate::tile::TileState;

/// Running tallies of the presence flags in a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounts {
    /// Tiles with `is_tilled`
    pub tilled: usize,
    /// Tiles with `has_crop`
    pub crops: usize,
    /// Tiles with `has_structure`
    pub structures: usize,
}

impl TileCounts {
    fn add(&mut self, state: &TileState) {
        self.tilled += usize::from(state.is_tilled);
        self.crops += usize::from(state.has_crop);
        self.structures += usize::from(state.has_structure);
    }

    fn sub(&mut self, state: &TileState) {
        self.tilled -= usize::from(state.is_tilled);
        self.crops -= usize::from(state.has_crop);
        self.structures -= usize::from(state.has_structure);
    }
}

/// A square region of the farm grid.
///
/// Only tiles with at least one presence flag are stored; every other tile
/// of the chunk is implicitly untilled and empty.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk coordinate
    coord: ChunkCoord,
    /// Section that owns this chunk
    section: SectionId,
    /// Tiles per chunk edge
    size: u32,
    /// Non-vacant tiles
    tiles: AHashMap<TileCoord, TileState>,
    /// Cached tallies over `tiles`
    counts: TileCounts,
    /// Persisted state has been read (or confirmed absent)
    loaded: bool,
    /// Modified since last save
    dirty: bool,
    /// Simulation tick of the last network sync
    last_sync_tick: Option<u64>,
}

impl Chunk {
    /// Creates a new empty chunk.
    #[must_use]
    pub fn new(coord: ChunkCoord, section: SectionId, size: u32) -> Self {
        Self {
            coord,
            section,
            size,
            tiles: AHashMap::new(),
            counts: TileCounts::default(),
            loaded: false,
            dirty: false,
            last_sync_tick: None,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Returns the owning section.
    #[must_use]
    pub const fn section(&self) -> SectionId {
        self.section
    }

    /// Returns the chunk size in tiles per edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Checks whether a tile belongs to this chunk.
    #[must_use]
    pub const fn contains(&self, tile: TileCoord) -> bool {
        self.coord.contains(tile, self.size)
    }

    /// Returns whether the chunk is dirty.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the chunk as clean.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Marks the chunk as dirty.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether persisted state has been applied to this chunk.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Marks the chunk as loaded.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Tick of the last network sync, if any.
    #[must_use]
    pub const fn last_sync_tick(&self) -> Option<u64> {
        self.last_sync_tick
    }

    /// Records a network sync at `tick`.
    pub fn mark_synced(&mut self, tick: u64) {
        self.last_sync_tick = Some(tick);
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Runs `edit` against a copy of the tile's record and stores the
    /// result on success.
    ///
    /// On `Err` nothing changes, the dirty flag included. A record left
    /// vacant by the edit is dropped from the map.
    fn apply(
        &mut self,
        tile: TileCoord,
        edit: impl FnOnce(&mut TileState) -> TileResult<()>,
    ) -> TileResult<()> {
        if !self.contains(tile) {
            return Err(TileRejection::OutsideChunk(tile));
        }

        let before = self.tiles.get(&tile).copied();
        let mut after = before.unwrap_or_else(|| TileState::new(tile));
        if let Err(rejection) = edit(&mut after) {
            trace!("Tile {tile} in chunk {}: {rejection}", self.coord);
            return Err(rejection);
        }

        if let Some(old) = &before {
            self.counts.sub(old);
        }
        if after.is_vacant() {
            self.tiles.remove(&tile);
        } else {
            self.counts.add(&after);
            self.tiles.insert(tile, after);
        }
        self.dirty = true;
        Ok(())
    }

    /// Tills a tile.
    pub fn till(&mut self, tile: TileCoord) -> TileResult<()> {
        self.apply(tile, |state| {
            if state.is_tilled {
                return Err(TileRejection::AlreadyTilled);
            }
            state.is_tilled = true;
            Ok(())
        })
    }

    /// Clears tillage.
    ///
    /// A crop on the tile is left standing on untilled ground.
    pub fn untill(&mut self, tile: TileCoord) -> TileResult<()> {
        self.apply(tile, |state| {
            if !state.is_tilled {
                return Err(TileRejection::NotTilled);
            }
            state.is_tilled = false;
            Ok(())
        })
    }

    /// Plants a crop at stage 0 on tilled, unoccupied ground.
    pub fn plant_crop(&mut self, crop: CropTypeId, tile: TileCoord) -> TileResult<()> {
        if self.contains(tile) && !self.tiles.contains_key(&tile) {
            trace!("Tile {tile} in chunk {}: no state to plant on", self.coord);
            return Err(TileRejection::NoTile);
        }
        self.apply(tile, |state| {
            if !state.is_tilled {
                return Err(TileRejection::NotTilled);
            }
            if state.has_crop {
                return Err(TileRejection::CropPresent);
            }
            if state.has_structure {
                return Err(TileRejection::StructurePresent);
            }
            state.has_crop = true;
            state.crop_type = crop;
            state.crop_stage = 0;
            state.pollinated = false;
            state.pollen_harvest_count = 0;
            Ok(())
        })
    }

    /// Removes the crop, keeping tillage.
    pub fn remove_crop(&mut self, tile: TileCoord) -> TileResult<()> {
        self.apply(tile, |state| {
            if !state.has_crop {
                return Err(TileRejection::NoCrop);
            }
            state.clear_crop();
            Ok(())
        })
    }

    /// Sets the growth stage of an existing crop.
    pub fn update_crop_stage(&mut self, tile: TileCoord, stage: u8) -> TileResult<()> {
        self.apply(tile, |state| {
            if !state.has_crop {
                return Err(TileRejection::NoCrop);
            }
            state.crop_stage = stage;
            Ok(())
        })
    }

    /// Sets the pollination flag of an existing crop.
    pub fn set_pollinated(&mut self, tile: TileCoord, pollinated: bool) -> TileResult<()> {
        self.apply(tile, |state| {
            if !state.has_crop {
                return Err(TileRejection::NoCrop);
            }
            state.pollinated = pollinated;
            Ok(())
        })
    }

    /// Counts one pollen harvest on an existing crop and returns the new
    /// total.
    pub fn record_pollen_harvest(&mut self, tile: TileCoord) -> TileResult<u32> {
        let mut count = 0;
        self.apply(tile, |state| {
            if !state.has_crop {
                return Err(TileRejection::NoCrop);
            }
            state.pollen_harvest_count = state.pollen_harvest_count.saturating_add(1);
            count = state.pollen_harvest_count;
            Ok(())
        })?;
        Ok(count)
    }

    /// Places a structure on a tile with neither a crop nor a structure.
    ///
    /// Tillage is not required.
    pub fn place_structure(&mut self, structure: StructureId, tile: TileCoord) -> TileResult<()> {
        self.apply(tile, |state| {
            if state.has_structure {
                return Err(TileRejection::StructurePresent);
            }
            if state.has_crop {
                return Err(TileRejection::CropPresent);
            }
            state.has_structure = true;
            state.structure_id = structure;
            Ok(())
        })
    }

    /// Removes a structure.
    pub fn remove_structure(&mut self, tile: TileCoord) -> TileResult<()> {
        self.apply(tile, |state| {
            if !state.has_structure {
                return Err(TileRejection::NoStructure);
            }
            state.clear_structure();
            Ok(())
        })
    }

    /// Drops every tile record.
    pub fn clear(&mut self) {
        if !self.tiles.is_empty() {
            self.tiles.clear();
            self.counts = TileCounts::default();
            self.dirty = true;
        }
    }

    /// Swaps in a fully validated tile set read from storage.
    pub(crate) fn replace_tiles(&mut self, tiles: AHashMap<TileCoord, TileState>) {
        let mut counts = TileCounts::default();
        for state in tiles.values() {
            counts.add(state);
        }
        self.tiles = tiles;
        self.counts = counts;
        self.loaded = true;
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Returns a copy of the tile's record, if it has one.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<TileState> {
        self.tiles.get(&tile).copied()
    }

    /// Checks whether a tile is tilled.
    #[must_use]
    pub fn is_tilled(&self, tile: TileCoord) -> bool {
        self.tiles.get(&tile).is_some_and(|s| s.is_tilled)
    }

    /// Checks whether a tile has a crop.
    #[must_use]
    pub fn has_crop(&self, tile: TileCoord) -> bool {
        self.tiles.get(&tile).is_some_and(|s| s.has_crop)
    }

    /// Returns the tile's record if it holds a crop.
    #[must_use]
    pub fn crop_at(&self, tile: TileCoord) -> Option<TileState> {
        self.tiles.get(&tile).filter(|s| s.has_crop).copied()
    }

    /// Checks whether a tile has a structure.
    #[must_use]
    pub fn has_structure(&self, tile: TileCoord) -> bool {
        self.tiles.get(&tile).is_some_and(|s| s.has_structure)
    }

    /// Returns the tile's record if it holds a structure.
    #[must_use]
    pub fn structure_at(&self, tile: TileCoord) -> Option<TileState> {
        self.tiles.get(&tile).filter(|s| s.has_structure).copied()
    }

    /// Snapshot of every crop tile, ordered by coordinate.
    #[must_use]
    pub fn crops(&self) -> Vec<TileState> {
        self.collect_sorted(|s| s.has_crop)
    }

    /// Snapshot of every structure tile, ordered by coordinate.
    #[must_use]
    pub fn structures(&self) -> Vec<TileState> {
        self.collect_sorted(|s| s.has_structure)
    }

    /// Snapshot of every stored record, ordered by coordinate.
    #[must_use]
    pub fn tiles(&self) -> Vec<TileState> {
        self.collect_sorted(|_| true)
    }

    fn collect_sorted(&self, keep: impl Fn(&TileState) -> bool) -> Vec<TileState> {
        let mut out: Vec<TileState> = self.tiles.values().filter(|s| keep(s)).copied().collect();
        out.sort_unstable_by_key(|s| (s.position.y, s.position.x));
        out
    }

    /// Number of stored records.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tilled tiles.
    #[must_use]
    pub const fn tilled_count(&self) -> usize {
        self.counts.tilled
    }

    /// Number of tiles with a crop.
    #[must_use]
    pub const fn crop_count(&self) -> usize {
        self.counts.crops
    }

    /// Number of tiles with a structure.
    #[must_use]
    pub const fn structure_count(&self) -> usize {
        self.counts.structures
    }

    /// Recomputes the tallies by scanning every record.
    #[must_use]
    pub fn recount(&self) -> TileCounts {
        let mut counts = TileCounts::default();
        for state in self.tiles.values() {
            counts.add(state);
        }
        counts
    }

    /// Cached tallies.
    #[must_use]
    pub const fn counts(&self) -> TileCounts {
        self.counts
    }
}
