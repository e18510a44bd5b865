//! Crop and pollination operations on [`FarmWorld`].
//!
//! The growth-rule engine decides when a crop advances and calls
//! [`FarmWorld::update_crop_stage`]; the breeding system drives the
//! pollination calls. Neither keeps its own copy of any tile.

use homestead_common::{CropTypeId, Locate, SectionId, WorldResult};

use crate::chunk::Chunk;
use crate::tile::TileState;
use crate::world::FarmWorld;

impl FarmWorld {
    /// Plants a crop at stage 0. The tile must be tilled and free.
    pub fn plant_crop(&mut self, at: impl Locate, crop: CropTypeId) -> WorldResult<()> {
        self.mutate(&at, |chunk, tile| chunk.plant_crop(crop, tile))
    }

    /// Removes the crop at a position; tillage is kept.
    pub fn remove_crop(&mut self, at: impl Locate) -> WorldResult<()> {
        self.mutate(&at, Chunk::remove_crop)
    }

    /// Writes a new growth stage for an existing crop.
    pub fn update_crop_stage(&mut self, at: impl Locate, stage: u8) -> WorldResult<()> {
        self.mutate(&at, |chunk, tile| chunk.update_crop_stage(tile, stage))
    }

    /// Checks whether a crop grows at a position.
    pub fn has_crop(&self, at: impl Locate) -> WorldResult<bool> {
        self.query(&at, Chunk::has_crop)
    }

    /// Copy of the crop record at a position.
    pub fn crop_at(&self, at: impl Locate) -> WorldResult<Option<TileState>> {
        self.query(&at, Chunk::crop_at)
    }

    /// Snapshot of every crop in every section.
    #[must_use]
    pub fn all_crops(&self) -> Vec<TileState> {
        self.store().chunks().flat_map(Chunk::crops).collect()
    }

    /// Snapshot of every crop in one section.
    #[must_use]
    pub fn section_crops(&self, section: SectionId) -> Vec<TileState> {
        self.store()
            .section_chunks(section)
            .flat_map(Chunk::crops)
            .collect()
    }

    /// Sets the pollination flag of an existing crop.
    pub fn set_pollinated(&mut self, at: impl Locate, pollinated: bool) -> WorldResult<()> {
        self.mutate(&at, |chunk, tile| chunk.set_pollinated(tile, pollinated))
    }

    /// Whether the crop at a position is pollinated; `false` without a crop.
    pub fn is_pollinated(&self, at: impl Locate) -> WorldResult<bool> {
        self.query(&at, |chunk, tile| {
            chunk.crop_at(tile).is_some_and(|s| s.pollinated)
        })
    }

    /// Counts one pollen harvest and returns the crop's new total.
    pub fn record_pollen_harvest(&mut self, at: impl Locate) -> WorldResult<u32> {
        self.mutate(&at, Chunk::record_pollen_harvest)
    }

    /// Pollen harvests taken from the crop at a position.
    pub fn pollen_harvest_count(&self, at: impl Locate) -> WorldResult<Option<u32>> {
        self.query(&at, |chunk, tile| {
            chunk.crop_at(tile).map(|s| s.pollen_harvest_count)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::section::{SectionConfig, SectionRegistry};
    use crate::world::FarmWorld;
    use homestead_common::{
        ChunkCoord, CropTypeId, SectionId, TileCoord, TileRejection, WorldDataError,
    };

    fn world() -> FarmWorld {
        FarmWorld::new(
            SectionRegistry::new(
                8,
                vec![
                    SectionConfig::new(SectionId::new(1), "a", ChunkCoord::new(0, 0), 2, 1),
                    SectionConfig::new(SectionId::new(2), "b", ChunkCoord::new(4, 0), 1, 1),
                ],
            )
            .expect("valid"),
        )
    }

    #[test]
    fn test_plant_requires_tillage() {
        let mut w = world();
        assert_eq!(
            w.plant_crop((1, 1), CropTypeId::new(3)),
            Err(WorldDataError::Rejected(TileRejection::NoTile))
        );
        w.till((1, 1)).expect("till");
        w.plant_crop((1, 1), CropTypeId::new(3)).expect("plant");
        assert_eq!(
            w.plant_crop((1, 1), CropTypeId::new(3)),
            Err(WorldDataError::Rejected(TileRejection::CropPresent))
        );
    }

    #[test]
    fn test_all_crops_spans_sections() {
        let mut w = world();
        for tile in [(1, 1), (9, 2), (33, 7)] {
            w.till(tile).expect("till");
            w.plant_crop(tile, CropTypeId::new(1)).expect("plant");
        }
        let mut positions: Vec<_> = w.all_crops().iter().map(|s| s.position).collect();
        positions.sort();
        assert_eq!(
            positions,
            vec![TileCoord::new(1, 1), TileCoord::new(9, 2), TileCoord::new(33, 7)]
        );
        assert_eq!(w.section_crops(SectionId::new(2)).len(), 1);
    }

    #[test]
    fn test_pollination_round() {
        let mut w = world();
        assert_eq!(w.is_pollinated((2, 2)), Ok(false));
        assert_eq!(w.pollen_harvest_count((2, 2)), Ok(None));
        w.till((2, 2)).expect("till");
        w.plant_crop((2, 2), CropTypeId::new(5)).expect("plant");

        w.set_pollinated((2, 2), true).expect("pollinate");
        assert_eq!(w.is_pollinated((2, 2)), Ok(true));
        assert_eq!(w.record_pollen_harvest((2, 2)), Ok(1));
        assert_eq!(w.pollen_harvest_count((2, 2)), Ok(Some(1)));

        w.remove_crop((2, 2)).expect("harvest");
        assert_eq!(
            w.record_pollen_harvest((2, 2)),
            Err(WorldDataError::Rejected(TileRejection::NoCrop))
        );
    }

    #[test]
    fn test_untilled_crop_persists() {
        let mut w = world();
        w.till((4, 4)).expect("till");
        w.plant_crop((4, 4), CropTypeId::new(1)).expect("plant");
        w.untill((4, 4)).expect("untill");
        assert_eq!(w.has_crop((4, 4)), Ok(true));
        assert_eq!(w.is_tilled((4, 4)), Ok(false));
        w.update_crop_stage((4, 4), 3).expect("still grows");
    }
}
