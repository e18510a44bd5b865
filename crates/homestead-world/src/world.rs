//! World-position entry point for farm state.
//!
//! [`FarmWorld`] resolves a position to its section and chunk, forwards the
//! call to the pre-allocated [`Chunk`], and converts every failure into a
//! [`WorldDataError`]. Crop and structure operations live in the `crops`
//! and `structures` modules as further `impl FarmWorld` blocks over the
//! same store.

use homestead_common::{
    ChunkCoord, Locate, SectionId, TileCoord, TileResult, WorldDataError, WorldResult,
};
use tracing::{error, info, warn};

use crate::chunk::Chunk;
use crate::config::WorldConfig;
use crate::section::{SectionError, SectionRegistry};
use crate::stats::WorldStats;
use crate::store::ChunkStore;
use crate::tile::TileState;

/// Section and chunk a tile resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// Owning section
    pub section: SectionId,
    /// Chunk within the section
    pub chunk: ChunkCoord,
}

/// Farm state of every section.
///
/// Constructed explicitly and passed to whoever needs it; there is no
/// global instance.
#[derive(Debug, Clone)]
pub struct FarmWorld {
    registry: SectionRegistry,
    store: ChunkStore,
}

impl FarmWorld {
    /// Allocates every chunk of every active section.
    #[must_use]
    pub fn new(registry: SectionRegistry) -> Self {
        let store = ChunkStore::new(&registry);
        info!(
            "Farm world ready: {} sections, {} chunks of {}x{} tiles",
            store.section_count(),
            store.chunk_count(),
            registry.chunk_size(),
            registry.chunk_size()
        );
        Self { registry, store }
    }

    /// Builds the world described by a config.
    pub fn from_config(config: &WorldConfig) -> Result<Self, SectionError> {
        let registry = SectionRegistry::new(config.chunk_size, config.sections.clone())?;
        Ok(Self::new(registry))
    }

    /// Section configuration.
    #[must_use]
    pub const fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// Underlying chunk store.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Underlying chunk store, mutably.
    pub fn store_mut(&mut self) -> &mut ChunkStore {
        &mut self.store
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolves a position to its section and chunk.
    pub fn resolve(&self, at: &impl Locate) -> WorldResult<ChunkKey> {
        let tile = at.tile();
        let Some(section) = self.registry.section_for(&tile) else {
            warn!("Tile {tile} is outside every active section");
            return Err(WorldDataError::Unresolved(tile));
        };
        Ok(ChunkKey {
            section,
            chunk: self.registry.world_to_chunk(tile),
        })
    }

    fn missing(registry: &SectionRegistry, key: ChunkKey) -> WorldDataError {
        error!("No chunk {} allocated in {}", key.chunk, key.section);
        debug_assert!(
            !registry
                .get(key.section)
                .is_some_and(|s| s.contains_chunk(key.chunk)),
            "active section {} lost chunk {}",
            key.section,
            key.chunk
        );
        WorldDataError::ChunkMissing {
            section: key.section,
            chunk: key.chunk,
        }
    }

    /// Chunk containing a position.
    pub fn chunk(&self, at: &impl Locate) -> WorldResult<&Chunk> {
        let key = self.resolve(at)?;
        self.store
            .get(key.section, key.chunk)
            .ok_or_else(|| Self::missing(&self.registry, key))
    }

    /// Chunk containing a position, mutably.
    pub fn chunk_mut(&mut self, at: &impl Locate) -> WorldResult<&mut Chunk> {
        let key = self.resolve(at)?;
        self.store
            .get_mut(key.section, key.chunk)
            .ok_or_else(|| Self::missing(&self.registry, key))
    }

    /// Chunk by key.
    #[must_use]
    pub fn chunk_by_key(&self, key: ChunkKey) -> Option<&Chunk> {
        self.store.get(key.section, key.chunk)
    }

    /// Chunk by key, mutably.
    pub fn chunk_by_key_mut(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        self.store.get_mut(key.section, key.chunk)
    }

    /// Applies a chunk mutation at a position.
    pub(crate) fn mutate<T>(
        &mut self,
        at: &impl Locate,
        op: impl FnOnce(&mut Chunk, TileCoord) -> TileResult<T>,
    ) -> WorldResult<T> {
        let tile = at.tile();
        let chunk = self.chunk_mut(&tile)?;
        Ok(op(chunk, tile)?)
    }

    /// Runs a chunk query at a position.
    pub(crate) fn query<T>(
        &self,
        at: &impl Locate,
        op: impl FnOnce(&Chunk, TileCoord) -> T,
    ) -> WorldResult<T> {
        let tile = at.tile();
        let chunk = self.chunk(&tile)?;
        Ok(op(chunk, tile))
    }

    // ------------------------------------------------------------------
    // Tillage
    // ------------------------------------------------------------------

    /// Tills the tile at a position.
    pub fn till(&mut self, at: impl Locate) -> WorldResult<()> {
        self.mutate(&at, Chunk::till)
    }

    /// Clears tillage at a position. A standing crop stays.
    pub fn untill(&mut self, at: impl Locate) -> WorldResult<()> {
        self.mutate(&at, Chunk::untill)
    }

    /// Checks whether the tile at a position is tilled.
    pub fn is_tilled(&self, at: impl Locate) -> WorldResult<bool> {
        self.query(&at, Chunk::is_tilled)
    }

    /// Copy of the full record at a position, if any.
    pub fn tile_state(&self, at: impl Locate) -> WorldResult<Option<TileState>> {
        self.query(&at, Chunk::tile)
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Records that the chunk containing a position was sent at `tick`.
    ///
    /// Sync is independent of saving; the dirty flag is left alone.
    pub fn mark_synced(&mut self, at: impl Locate, tick: u64) -> WorldResult<()> {
        self.chunk_mut(&at)?.mark_synced(tick);
        Ok(())
    }

    /// Tick at which the chunk containing a position was last sent.
    pub fn last_sync_tick(&self, at: impl Locate) -> WorldResult<Option<u64>> {
        self.query(&at, |chunk, _| chunk.last_sync_tick())
    }

    // ------------------------------------------------------------------
    // Whole-world
    // ------------------------------------------------------------------

    /// Totals over every section.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats::collect(&self.store)
    }

    /// Keys of chunks with unsaved changes, in a stable order.
    #[must_use]
    pub fn dirty_chunks(&self) -> Vec<ChunkKey> {
        let mut keys: Vec<ChunkKey> = self
            .store
            .chunks()
            .filter(|c| c.is_dirty())
            .map(|c| ChunkKey {
                section: c.section(),
                chunk: c.coord(),
            })
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Removes every tile record; chunks stay allocated.
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        info!("Cleared all farm tiles");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionConfig;
    use glam::{Vec2, Vec3};
    use homestead_common::{CropTypeId, StructureId, TileRejection};

    fn world() -> FarmWorld {
        let registry = SectionRegistry::new(
            16,
            vec![
                SectionConfig::new(SectionId::new(1), "home", ChunkCoord::new(0, 0), 2, 2),
                SectionConfig::new(SectionId::new(2), "west", ChunkCoord::new(-3, -1), 1, 1),
            ],
        )
        .expect("valid");
        FarmWorld::new(registry)
    }

    #[test]
    fn test_harvest_scenario_by_position() {
        let mut w = world();
        assert!(w.till(Vec2::new(5.2, 5.9)).is_ok());
        assert!(w.plant_crop(Vec2::new(5.5, 5.5), CropTypeId::new(7)).is_ok());
        assert!(w.update_crop_stage(TileCoord::new(5, 5), 2).is_ok());

        let crop = w.crop_at(Vec3::new(5.0, 5.0, 1.0)).expect("resolved").expect("crop");
        assert_eq!(crop.crop_type, CropTypeId::new(7));
        assert_eq!(crop.crop_stage, 2);
        assert_eq!(crop.position, TileCoord::new(5, 5));

        assert!(w.remove_crop((5, 5)).is_ok());
        assert_eq!(w.has_crop((5, 5)), Ok(false));
        assert_eq!(w.is_tilled((5, 5)), Ok(true));
    }

    #[test]
    fn test_unresolved_positions_touch_nothing() {
        let mut w = world();
        let outside = TileCoord::new(40, 0);
        let err = WorldDataError::Unresolved(outside);

        assert_eq!(w.till(outside), Err(err));
        assert_eq!(w.untill(outside), Err(err));
        assert_eq!(w.plant_crop(outside, CropTypeId::new(1)), Err(err));
        assert_eq!(w.remove_crop(outside), Err(err));
        assert_eq!(w.update_crop_stage(outside, 1), Err(err));
        assert_eq!(w.place_structure(outside, StructureId::new(1)), Err(err));
        assert_eq!(w.remove_structure(outside), Err(err));
        assert_eq!(w.set_pollinated(outside, true), Err(err));
        assert_eq!(w.record_pollen_harvest(outside), Err(err));
        assert_eq!(w.is_tilled(outside), Err(err));
        assert_eq!(w.has_crop(outside), Err(err));
        assert_eq!(w.has_structure(outside), Err(err));
        assert_eq!(w.crop_at(outside), Err(err));
        assert_eq!(w.structure_at(outside), Err(err));
        assert_eq!(w.tile_state(outside), Err(err));

        let stats = w.stats();
        assert_eq!(stats.total_tiles, 0);
        assert_eq!(stats.dirty_chunks, 0);
    }

    #[test]
    fn test_negative_positions_route_to_west_section() {
        let mut w = world();
        w.till(Vec2::new(-40.5, -0.5)).expect("till");
        let chunk = w.chunk(&TileCoord::new(-41, -1)).expect("resolved");
        assert_eq!(chunk.section(), SectionId::new(2));
        assert_eq!(chunk.coord(), ChunkCoord::new(-3, -1));
        assert!(chunk.is_tilled(TileCoord::new(-41, -1)));
    }

    #[test]
    fn test_rejections_are_typed() {
        let mut w = world();
        assert_eq!(
            w.untill((1, 1)),
            Err(WorldDataError::Rejected(TileRejection::NotTilled))
        );
        w.till((1, 1)).expect("till");
        assert_eq!(
            w.till((1, 1)),
            Err(WorldDataError::Rejected(TileRejection::AlreadyTilled))
        );
    }

    #[test]
    fn test_stats_track_scripted_operations() {
        let mut w = world();
        let mut tilled = 0usize;
        let mut crops = 0usize;
        for i in 0..32 {
            if w.till((i, i)).is_ok() {
                tilled += 1;
            }
            if i % 3 == 0 && w.plant_crop((i, i), CropTypeId::new(2)).is_ok() {
                crops += 1;
            }
            if i % 6 == 0 && w.remove_crop((i, i)).is_ok() {
                crops -= 1;
            }
        }
        w.place_structure((3, 20), StructureId::new(1)).expect("place");

        let stats = w.stats();
        assert_eq!(stats.total_chunks, 5);
        assert_eq!(stats.total_tilled_tiles, tilled);
        assert_eq!(stats.total_crops, crops);
        // Diagonal crops fall in chunk (0,0) and (1,1).
        assert_eq!(stats.chunks_with_crops, 2);
        assert_eq!(stats.total_structures, 1);
        assert_eq!(stats.chunks_with_structures, 1);
        assert_eq!(stats.loaded_chunks, 0);
        assert_eq!(stats.dirty_chunks, 3);
        assert!(stats.memory_usage_mb > 0.0);

        let map = stats.to_map();
        assert_eq!(map["TotalTilledTiles"], tilled as f64);
        assert_eq!(map["TotalCrops"], crops as f64);
    }

    #[test]
    fn test_sync_tick_is_per_chunk() {
        let mut w = world();
        assert_eq!(w.last_sync_tick((1, 1)), Ok(None));
        w.till((1, 1)).expect("till");
        w.mark_synced(Vec2::new(1.5, 1.5), 42).expect("sync");

        assert_eq!(w.last_sync_tick((15, 15)), Ok(Some(42)));
        assert_eq!(w.last_sync_tick((16, 0)), Ok(None));
        assert_eq!(w.dirty_chunks().len(), 1);

        let outside = TileCoord::new(40, 0);
        assert_eq!(
            w.mark_synced(outside, 1),
            Err(WorldDataError::Unresolved(outside))
        );
    }

    #[test]
    fn test_oversized_chunks_are_refused() {
        let config = WorldConfig {
            chunk_size: 300,
            ..WorldConfig::default()
        };
        assert!(matches!(
            FarmWorld::from_config(&config),
            Err(SectionError::ChunkTooLarge(300))
        ));
    }

    #[test]
    fn test_dirty_chunks_and_clear_all() {
        let mut w = world();
        w.till((17, 1)).expect("till");
        w.till((-48, -16)).expect("till");
        assert_eq!(
            w.dirty_chunks(),
            vec![
                ChunkKey {
                    section: SectionId::new(1),
                    chunk: ChunkCoord::new(1, 0)
                },
                ChunkKey {
                    section: SectionId::new(2),
                    chunk: ChunkCoord::new(-3, -1)
                },
            ]
        );

        w.clear_all();
        assert_eq!(w.stats().total_tiles, 0);
        assert_eq!(w.stats().total_chunks, 5);
        assert_eq!(w.is_tilled((17, 1)), Ok(false));
    }
}
