//! # Homestead
//!
//! Command-line tool for farm saves: prints world statistics, dumps single
//! chunks, and rewrites a save directory in the configured chunk format.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use homestead_world::{WorldConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print totals over every section
    Stats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print every tile record of one chunk
    Dump {
        /// Section id
        #[arg(allow_negative_numbers = true)]
        section: i32,
        /// Chunk x coordinate
        #[arg(allow_negative_numbers = true)]
        chunk_x: i32,
        /// Chunk y coordinate
        #[arg(allow_negative_numbers = true)]
        chunk_y: i32,
    },
    /// Rewrite every chunk file in the configured save format
    Migrate,
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("homestead_world=info".parse()?)
                .add_directive("homestead_inspect=info".parse()?),
        )
        .init();

    let args = Args::parse();
    info!("Homestead {}", env!("CARGO_PKG_VERSION"));

    let mut config = WorldConfig::load_from(&args.config);
    config.validate();

    match args.command {
        Command::Stats { json } => println!("{}", commands::stats(&config, json)?),
        Command::Dump {
            section,
            chunk_x,
            chunk_y,
        } => print!("{}", commands::dump(&config, section, chunk_x, chunk_y)?),
        Command::Migrate => {
            let written = commands::migrate(&config)?;
            println!("Rewrote {written} chunks as {:?}", config.save_format);
        },
    }
    Ok(())
}
