//! Command implementations. Each returns the text to print.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use homestead_common::{ChunkCoord, SectionId};
use homestead_world::{
    ChunkFormat, ChunkKey, ChunkPersistence, FarmWorld, LoadReport, SaveSweep, WorldConfig,
};
use tracing::{info, warn};

/// Builds the configured world and loads its save directory.
fn open_world(config: &WorldConfig) -> Result<(FarmWorld, ChunkPersistence, LoadReport)> {
    let mut world = FarmWorld::from_config(config).context("invalid section layout")?;
    let persistence = ChunkPersistence::new(&config.save_dir, config.save_format);
    let report = persistence.load_all(&mut world);
    Ok((world, persistence, report))
}

/// Renders world totals as text or JSON.
pub fn stats(config: &WorldConfig, json: bool) -> Result<String> {
    let (world, _, report) = open_world(config)?;
    if report.failed > 0 {
        warn!("{} chunk files could not be read", report.failed);
    }
    let stats = world.stats();
    if json {
        return Ok(serde_json::to_string_pretty(&stats)?);
    }
    Ok(stats.to_string())
}

/// Renders one chunk's records, one tile per line.
pub fn dump(config: &WorldConfig, section: i32, chunk_x: i32, chunk_y: i32) -> Result<String> {
    let (world, _, _) = open_world(config)?;
    let key = ChunkKey {
        section: SectionId::new(section),
        chunk: ChunkCoord::new(chunk_x, chunk_y),
    };
    let Some(chunk) = world.chunk_by_key(key) else {
        bail!("no chunk {} in {}", key.chunk, key.section);
    };

    let mut out = String::new();
    let counts = chunk.counts();
    writeln!(
        out,
        "chunk {} of {}: {} tiles, {} tilled, {} crops, {} structures",
        chunk.coord(),
        chunk.section(),
        chunk.tile_count(),
        counts.tilled,
        counts.crops,
        counts.structures
    )?;
    for tile in chunk.tiles() {
        write!(out, "{}", tile.position)?;
        if tile.is_tilled {
            out.push_str(" tilled");
        }
        if tile.has_crop {
            write!(out, " crop={} stage={}", tile.crop_type.raw(), tile.crop_stage)?;
            if tile.pollinated {
                write!(out, " pollinated harvests={}", tile.pollen_harvest_count)?;
            }
        }
        if tile.has_structure {
            write!(out, " structure={}", tile.structure_id.raw())?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// Chunks whose state `format` cannot hold.
fn legacy_losses(world: &FarmWorld, format: ChunkFormat) -> usize {
    if format != ChunkFormat::Legacy {
        return 0;
    }
    world.store().chunks().filter(|c| !c.fits_legacy()).count()
}

/// Rewrites every chunk in the configured format. Returns the files written.
///
/// Refuses to run when any existing file fails to load, since rewriting
/// would replace it with an empty chunk.
pub fn migrate(config: &WorldConfig) -> Result<usize> {
    let (mut world, persistence, report) = open_world(config)?;
    if report.failed > 0 {
        bail!(
            "{} chunk files in {} could not be read; fix or remove them first",
            report.failed,
            config.save_dir.display()
        );
    }
    let lossy = legacy_losses(&world, config.save_format);
    if lossy > 0 {
        warn!("{lossy} chunks hold structures or pollination state that legacy format drops");
    }

    for chunk in world.store_mut().chunks_mut() {
        chunk.mark_dirty();
    }
    let persistence = persistence.allow_lossy(true);
    let mut sweep = SaveSweep::new(config.sweep_budget);
    let written = sweep.finish(&mut world, &persistence);
    info!("Migrated {written} chunks to {:?}", config.save_format);

    let left = world.dirty_chunks().len();
    if left > 0 {
        bail!("{left} chunks could not be written");
    }
    Ok(written)
}
