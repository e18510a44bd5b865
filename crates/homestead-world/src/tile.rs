//! Per-tile farming state.

use homestead_common::{CropTypeId, StructureId, TileCoord};
use serde::{Deserialize, Serialize};

/// Farming state of one tile.
///
/// Values of this type are always copies: the owning chunk replaces its
/// stored record wholesale on every successful mutation, and queries hand out
/// snapshots rather than references into the chunk's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileState {
    /// Absolute tile coordinate.
    pub position: TileCoord,
    /// Ground has been prepared for planting.
    pub is_tilled: bool,
    /// A crop is growing here.
    pub has_crop: bool,
    /// Crop type, meaningful only while `has_crop`.
    pub crop_type: CropTypeId,
    /// Growth stage, meaningful only while `has_crop`.
    pub crop_stage: u8,
    /// A structure stands here.
    pub has_structure: bool,
    /// Structure type, meaningful only while `has_structure`.
    pub structure_id: StructureId,
    /// Crop has been pollinated.
    pub pollinated: bool,
    /// Number of pollen harvests taken from the current crop.
    pub pollen_harvest_count: u32,
}

impl TileState {
    /// Creates an empty record for a tile.
    #[must_use]
    pub const fn new(position: TileCoord) -> Self {
        Self {
            position,
            is_tilled: false,
            has_crop: false,
            crop_type: CropTypeId::new(0),
            crop_stage: 0,
            has_structure: false,
            structure_id: StructureId::new(0),
            pollinated: false,
            pollen_harvest_count: 0,
        }
    }

    /// True when none of the presence flags is set.
    ///
    /// Chunks never store such a record.
    #[must_use]
    pub const fn is_vacant(&self) -> bool {
        !self.is_tilled && !self.has_crop && !self.has_structure
    }

    /// Resets every crop-related field, pollination included.
    pub fn clear_crop(&mut self) {
        self.has_crop = false;
        self.crop_type = CropTypeId::new(0);
        self.crop_stage = 0;
        self.pollinated = false;
        self.pollen_harvest_count = 0;
    }

    /// Resets the structure fields.
    pub fn clear_structure(&mut self) {
        self.has_structure = false;
        self.structure_id = StructureId::new(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_is_vacant() {
        let tile = TileState::new(TileCoord::new(3, -4));
        assert!(tile.is_vacant());
        assert_eq!(tile.position, TileCoord::new(3, -4));
    }

    #[test]
    fn test_clear_crop_resets_pollination() {
        let mut tile = TileState::new(TileCoord::new(0, 0));
        tile.is_tilled = true;
        tile.has_crop = true;
        tile.crop_type = CropTypeId::new(9);
        tile.crop_stage = 3;
        tile.pollinated = true;
        tile.pollen_harvest_count = 2;

        tile.clear_crop();

        assert!(tile.is_tilled);
        assert!(!tile.has_crop);
        assert_eq!(tile.crop_type.raw(), 0);
        assert_eq!(tile.crop_stage, 0);
        assert!(!tile.pollinated);
        assert_eq!(tile.pollen_harvest_count, 0);
        assert!(!tile.is_vacant());
    }
}
