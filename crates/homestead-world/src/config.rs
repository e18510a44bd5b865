//! Farm world configuration.
//!
//! Holds the chunk size, the section layout, and persistence settings.
//! Configuration can be loaded from and saved to a TOML file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use homestead_common::{ChunkCoord, SectionId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codec::ChunkFormat;
use crate::section::SectionConfig;

/// Configuration file name.
pub const CONFIG_FILE: &str = "homestead.toml";

/// Farm world configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Tiles per chunk edge
    pub chunk_size: u32,

    // === Persistence ===
    /// Directory holding one file per chunk
    pub save_dir: PathBuf,
    /// Layout written by saves
    pub save_format: ChunkFormat,
    /// Dirty chunks persisted per sweep tick
    pub sweep_budget: usize,

    // === Layout ===
    /// Playable sections
    pub sections: Vec<SectionConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            save_dir: PathBuf::from("saves/farm"),
            save_format: ChunkFormat::Extended,
            sweep_budget: 8,
            sections: vec![SectionConfig::new(
                SectionId::new(0),
                "Home Farm",
                ChunkCoord::new(0, 0),
                4,
                4,
            )],
        }
    }
}

impl WorldConfig {
    /// Loads a farm config, falling back to defaults when the file is
    /// missing, unreadable, or not valid TOML.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No farm config at {}, using default layout", path.display());
                return Self::default();
            },
            Err(e) => {
                warn!("Cannot read farm config {}: {e}", path.display());
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(config) => {
                info!(
                    "Loaded farm config from {} ({} sections, chunk size {})",
                    path.display(),
                    config.sections.len(),
                    config.chunk_size
                );
                config
            },
            Err(e) => {
                warn!("Invalid farm config {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Writes the farm config as pretty TOML, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved farm config to {}", path.display());
        Ok(())
    }

    /// Clamp values to supported ranges.
    ///
    /// The chunk size bound keeps every chunk's tile count inside the
    /// format's `u16` record count.
    pub fn validate(&mut self) {
        self.chunk_size = self.chunk_size.clamp(4, 128);
        self.sweep_budget = self.sweep_budget.max(1);
    }
}
