//! Binary chunk format for save files and chunk transfer.
//!
//! Two layouts are understood, both little-endian:
//!
//! ```text
//! Legacy (no marker)
//!   header  i32 chunk_x | i32 chunk_y | i32 section_id | u16 tile_count   (14 bytes)
//!   record  u8 tilled | u8 has_crop | u16 crop_type | u8 crop_stage
//!           | i32 world_x | i32 world_y                                    (13 bytes)
//!
//! Extended
//!   prefix  b"HSTL" | u8 version (= 1)                                     (5 bytes)
//!   header  as legacy                                                      (14 bytes)
//!   record  legacy record | u8 has_structure | u32 structure_id
//!           | u8 pollinated | u32 pollen_harvest_count                     (23 bytes)
//! ```
//!
//! Legacy encoding has no room for structures or pollination, so tiles that
//! hold only a structure are omitted and the extra fields are dropped.

use ahash::AHashMap;
use homestead_common::{
    ChunkCoord, CropTypeId, FormatVersion, MagicBytes, SectionId, StructureId, TileCoord,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::chunk::Chunk;
use crate::tile::TileState;

/// Legacy header size in bytes.
pub const HEADER_SIZE: usize = 14;

/// Legacy record size in bytes.
pub const LEGACY_RECORD_SIZE: usize = 13;

/// Extended record size in bytes.
pub const EXTENDED_RECORD_SIZE: usize = 23;

/// Magic plus version byte preceding an extended header.
pub const VERSION_PREFIX_SIZE: usize = 5;

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Buffer ended before a field could be read
    #[error("buffer truncated: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        /// Read offset
        offset: usize,
        /// Bytes required from the offset
        needed: usize,
        /// Total buffer length
        len: usize,
    },
    /// Declared tile count does not fit the buffer
    #[error("tile count {count} needs {needed} bytes, buffer has {len}")]
    BadTileCount {
        /// Declared count
        count: u16,
        /// Bytes implied by the count
        needed: usize,
        /// Total buffer length
        len: usize,
    },
    /// Version byte not understood by this build
    #[error("unsupported chunk format {0}")]
    UnknownVersion(FormatVersion),
    /// Buffer belongs to a different chunk
    #[error("buffer is for chunk {found} in section {found_section}, expected {expected} in {expected_section}")]
    CoordinateMismatch {
        /// Target chunk
        expected: ChunkCoord,
        /// Target section
        expected_section: SectionId,
        /// Chunk named in the buffer
        found: ChunkCoord,
        /// Section named in the buffer
        found_section: i32,
    },
    /// A record addresses a tile of another chunk
    #[error("tile {0} is outside the chunk")]
    TileOutsideChunk(TileCoord),
    /// Two records address the same tile
    #[error("tile {0} appears twice")]
    DuplicateTile(TileCoord),
    /// A record holds both a crop and a structure
    #[error("tile {0} holds both a crop and a structure")]
    ConflictingTile(TileCoord),
    /// More tiles than a `u16` count can describe
    #[error("{0} tiles exceed the format limit")]
    TooManyTiles(usize),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Layout used when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkFormat {
    /// Marker-less 13-byte records.
    Legacy,
    /// Versioned 23-byte records carrying structures and pollination.
    #[default]
    Extended,
}

impl ChunkFormat {
    /// Bytes per tile record.
    #[must_use]
    pub const fn record_size(self) -> usize {
        match self {
            Self::Legacy => LEGACY_RECORD_SIZE,
            Self::Extended => EXTENDED_RECORD_SIZE,
        }
    }

    /// Version marker for this layout.
    #[must_use]
    pub const fn version(self) -> FormatVersion {
        match self {
            Self::Legacy => FormatVersion::LEGACY,
            Self::Extended => FormatVersion::EXTENDED,
        }
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Sequential little-endian writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends a `u8`.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a bool as `0`/`1`.
    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Appends a `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends an `i32`.
    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Returns the written bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential little-endian reader over a borrowed buffer.
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Starts reading at the beginning of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let end = self.offset + N;
        let slice = self.bytes.get(self.offset..end).ok_or(CodecError::Truncated {
            offset: self.offset,
            needed: N,
            len: self.bytes.len(),
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    /// Reads raw bytes.
    pub fn get_bytes<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        self.take::<N>()
    }

    /// Reads a `u8`.
    pub fn get_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads a bool; any non-zero byte is `true`.
    pub fn get_bool(&mut self) -> CodecResult<bool> {
        Ok(self.get_u8()? != 0)
    }

    /// Reads a `u16`.
    pub fn get_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Reads an `i32`.
    pub fn get_i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Reads a `u32`.
    pub fn get_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }
}

// ============================================================================
// Header
// ============================================================================

/// Decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Layout of the records that follow.
    pub format: ChunkFormat,
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Raw section id.
    pub section: i32,
    /// Number of records.
    pub tile_count: u16,
}

impl ChunkHeader {
    /// Reads and validates the header, checking the buffer is long enough
    /// for every declared record.
    pub fn read(bytes: &[u8]) -> CodecResult<(Self, ByteReader<'_>)> {
        let mut reader = ByteReader::new(bytes);
        let format = if bytes.len() >= VERSION_PREFIX_SIZE
            && bytes[..4] == MagicBytes::TILE_CHUNK.0
        {
            reader.get_bytes::<4>()?;
            match FormatVersion(reader.get_u8()?) {
                FormatVersion::EXTENDED => ChunkFormat::Extended,
                other => return Err(CodecError::UnknownVersion(other)),
            }
        } else {
            ChunkFormat::Legacy
        };

        if reader.remaining() < HEADER_SIZE {
            return Err(CodecError::Truncated {
                offset: bytes.len() - reader.remaining(),
                needed: HEADER_SIZE,
                len: bytes.len(),
            });
        }
        let coord = ChunkCoord::new(reader.get_i32()?, reader.get_i32()?);
        let section = reader.get_i32()?;
        let tile_count = reader.get_u16()?;

        let body = usize::from(tile_count) * format.record_size();
        if body > reader.remaining() {
            return Err(CodecError::BadTileCount {
                count: tile_count,
                needed: bytes.len() - reader.remaining() + body,
                len: bytes.len(),
            });
        }

        Ok((
            Self {
                format,
                coord,
                section,
                tile_count,
            },
            reader,
        ))
    }
}

// ============================================================================
// Chunk encode/decode
// ============================================================================

fn write_record(w: &mut ByteWriter, state: &TileState, format: ChunkFormat) {
    w.put_bool(state.is_tilled);
    w.put_bool(state.has_crop);
    w.put_u16(state.crop_type.raw());
    w.put_u8(state.crop_stage);
    w.put_i32(state.position.x);
    w.put_i32(state.position.y);
    if format == ChunkFormat::Extended {
        w.put_bool(state.has_structure);
        w.put_u32(state.structure_id.raw());
        w.put_bool(state.pollinated);
        w.put_u32(state.pollen_harvest_count);
    }
}

fn read_record(r: &mut ByteReader<'_>, format: ChunkFormat) -> CodecResult<TileState> {
    let is_tilled = r.get_bool()?;
    let has_crop = r.get_bool()?;
    let crop_type = r.get_u16()?;
    let crop_stage = r.get_u8()?;
    let x = r.get_i32()?;
    let y = r.get_i32()?;

    let mut state = TileState::new(TileCoord::new(x, y));
    state.is_tilled = is_tilled;
    if has_crop {
        state.has_crop = true;
        state.crop_type = CropTypeId::new(crop_type);
        state.crop_stage = crop_stage;
    }

    if format == ChunkFormat::Extended {
        let has_structure = r.get_bool()?;
        let structure_id = r.get_u32()?;
        let pollinated = r.get_bool()?;
        let pollen = r.get_u32()?;
        if has_structure {
            state.has_structure = true;
            state.structure_id = StructureId::new(structure_id);
        }
        if has_crop {
            state.pollinated = pollinated;
            state.pollen_harvest_count = pollen;
        }
    }
    Ok(state)
}

impl Chunk {
    /// Checks whether the legacy layout can hold every record.
    ///
    /// False when any tile has a structure or pollination state.
    #[must_use]
    pub fn fits_legacy(&self) -> bool {
        self.structure_count() == 0
            && self
                .crops()
                .iter()
                .all(|s| !s.pollinated && s.pollen_harvest_count == 0)
    }

    /// Encodes the chunk's tiles.
    pub fn encode(&self, format: ChunkFormat) -> CodecResult<Vec<u8>> {
        let tiles: Vec<TileState> = match format {
            ChunkFormat::Legacy => self
                .tiles()
                .into_iter()
                .filter(|s| s.is_tilled || s.has_crop)
                .collect(),
            ChunkFormat::Extended => self.tiles(),
        };
        let count = u16::try_from(tiles.len()).map_err(|_| CodecError::TooManyTiles(tiles.len()))?;

        let prefix = match format {
            ChunkFormat::Legacy => 0,
            ChunkFormat::Extended => VERSION_PREFIX_SIZE,
        };
        let mut w = ByteWriter::with_capacity(prefix + HEADER_SIZE + tiles.len() * format.record_size());
        if format == ChunkFormat::Extended {
            w.put_bytes(&MagicBytes::TILE_CHUNK.0);
            w.put_u8(format.version().0);
        }
        w.put_i32(self.coord().x);
        w.put_i32(self.coord().y);
        w.put_i32(self.section().raw());
        w.put_u16(count);
        for state in &tiles {
            write_record(&mut w, state, format);
        }
        Ok(w.finish())
    }

    /// Replaces this chunk's tiles with the contents of `bytes`.
    ///
    /// The whole buffer is validated before anything is applied; on error
    /// the chunk keeps its previous tiles and flags. Success leaves the
    /// chunk loaded and clean.
    pub fn decode(&mut self, bytes: &[u8]) -> CodecResult<()> {
        match self.parse(bytes) {
            Ok(tiles) => {
                debug!(
                    "Decoded {} tiles into chunk {} of {}",
                    tiles.len(),
                    self.coord(),
                    self.section()
                );
                self.replace_tiles(tiles);
                Ok(())
            },
            Err(e) => {
                error!("Rejected data for chunk {} of {}: {e}", self.coord(), self.section());
                Err(e)
            },
        }
    }

    /// Builds a fresh chunk from `bytes`, taking coordinate and section
    /// from the header.
    pub fn from_bytes(bytes: &[u8], size: u32) -> CodecResult<Self> {
        let (header, _) = ChunkHeader::read(bytes)?;
        let mut chunk = Self::new(header.coord, SectionId::new(header.section), size);
        chunk.decode(bytes)?;
        Ok(chunk)
    }

    fn parse(&self, bytes: &[u8]) -> CodecResult<AHashMap<TileCoord, TileState>> {
        let (header, mut reader) = ChunkHeader::read(bytes)?;
        if header.coord != self.coord() || header.section != self.section().raw() {
            return Err(CodecError::CoordinateMismatch {
                expected: self.coord(),
                expected_section: self.section(),
                found: header.coord,
                found_section: header.section,
            });
        }

        let mut tiles = AHashMap::with_capacity(usize::from(header.tile_count));
        for _ in 0..header.tile_count {
            let state = read_record(&mut reader, header.format)?;
            let pos = state.position;
            if !self.contains(pos) {
                return Err(CodecError::TileOutsideChunk(pos));
            }
            if state.has_crop && state.has_structure {
                return Err(CodecError::ConflictingTile(pos));
            }
            if state.is_vacant() {
                debug!("Skipping vacant record for tile {pos}");
                continue;
            }
            if tiles.insert(pos, state).is_some() {
                return Err(CodecError::DuplicateTile(pos));
            }
        }
        Ok(tiles)
    }
}
