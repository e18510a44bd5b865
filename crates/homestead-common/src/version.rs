//! Version markers for the tile chunk wire format.

/// Magic bytes for format identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicBytes(pub [u8; 4]);

impl MagicBytes {
    /// Versioned tile chunk magic bytes.
    pub const TILE_CHUNK: Self = Self(*b"HSTL");
}

/// Version byte written after [`MagicBytes::TILE_CHUNK`].
///
/// The unversioned 13-byte-record layout has no marker at all and is
/// addressed as [`FormatVersion::LEGACY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatVersion(pub u8);

impl FormatVersion {
    /// Header-less layout: tillage and crop only.
    pub const LEGACY: Self = Self(0);

    /// Adds structure and pollination fields to every record.
    pub const EXTENDED: Self = Self(1);

    /// Newest version this build writes.
    pub const CURRENT: Self = Self::EXTENDED;

    /// Checks whether this build can decode data written at `self`.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        self.0 <= Self::CURRENT.0
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
