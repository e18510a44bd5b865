//! # Homestead Common
//!
//! Common types shared by the Homestead farming-state crates.
//!
//! This crate provides:
//! - Coordinate types (tile, chunk) and the [`Locate`] trait
//! - ID types (SectionId, CropTypeId, StructureId)
//! - Version markers for the chunk wire format
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
