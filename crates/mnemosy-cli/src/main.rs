//! Mnemosy CLI - command-line driver for material libraries.
//!
//! Runs one registry operation per invocation against the known-libraries
//! store, so libraries can be inspected and reorganised without the editor.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use mnemosy_core::{CollectionStore, MaterialLibraryRegistry, ThumbnailManager};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mnemosy")]
#[command(about = "Manage Mnemosy material libraries")]
struct Args {
    /// Known-libraries database (defaults to the per-user config directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let store = match &args.store {
        Some(path) => CollectionStore::open_at(path)
            .with_context(|| format!("opening library store {}", path.display()))?,
        None => CollectionStore::open().context("opening the default library store")?,
    };
    let mut registry = MaterialLibraryRegistry::new(store, ThumbnailManager::default());
    let loaded = registry.load()?;
    debug!("{} libraries loaded", loaded);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&mut registry, args.command, &mut out)?;
    registry.save_all()?;

    Ok(())
}
