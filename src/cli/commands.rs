//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed
//! arguments and returns an `anyhow::Result<()>`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::artwork::{ArtworkCache, JpegTranscoder, LastFmClient};
use crate::config::{self, Config};
use crate::indexing::{
    ChannelSink, CollectionChecker, Indexer, IndexingMessage, IndexingOptions, IndexingReport,
};
use crate::metadata::LoftyExtractor;
use crate::repository::sqlite::db_url;
use crate::repository::{Repository, SqliteRepository};
use crate::scanner;
use crate::ticks::SystemClock;

/// Chorale CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the collection database against the music folders
    Index {
        /// Run a full pass even when the collection looks up to date
        #[arg(long)]
        force: bool,
        /// Only reconcile album artwork, leaving tracks untouched
        #[arg(long)]
        artwork_only: bool,
    },
    /// Manage the folders that are scanned for music
    Folders {
        #[command(subcommand)]
        action: FoldersAction,
    },
    /// Show collection statistics and whether indexing is needed
    Status,
    /// Maintain the artwork cache
    Artwork {
        #[command(subcommand)]
        action: ArtworkAction,
    },
}

/// Folder management actions
#[derive(Subcommand)]
pub enum FoldersAction {
    /// Add a music folder
    Add {
        /// Path to the directory to scan
        path: PathBuf,
    },
    /// Remove a music folder
    Remove {
        /// Path of a previously added directory
        path: PathBuf,
    },
    /// List all configured folders
    List,
}

/// Artwork cache actions
#[derive(Subcommand)]
pub enum ArtworkAction {
    /// Delete cached artwork files no database row references
    Gc,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load();

    match &cli.command {
        Commands::Index {
            force,
            artwork_only,
        } => cmd_index(&rt, &config, *force, *artwork_only),
        Commands::Folders { action } => match action {
            FoldersAction::Add { path } => cmd_folders_add(&rt, &config, path),
            FoldersAction::Remove { path } => cmd_folders_remove(&rt, &config, path),
            FoldersAction::List => cmd_folders_list(&rt, &config),
        },
        Commands::Status => cmd_status(&rt, &config),
        Commands::Artwork { action } => match action {
            ArtworkAction::Gc => cmd_artwork_gc(&rt, &config),
        },
    }
}

async fn open_repository(config: &Config) -> anyhow::Result<SqliteRepository> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(SqliteRepository::connect(&db_url(Some(&db_path))).await?)
}

fn open_cache(config: &Config) -> ArtworkCache {
    match &config.storage.artwork_cache_dir {
        Some(dir) => ArtworkCache::new(dir, Box::new(JpegTranscoder)),
        None => ArtworkCache::default_location(),
    }
}

// ============================================================================
// Individual command implementations
// ============================================================================

fn cmd_index(rt: &Runtime, config: &Config, force: bool, artwork_only: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let extractor = LoftyExtractor;
        let provider = LastFmClient::new(
            config
                .credentials
                .lastfm_api_key
                .clone()
                .unwrap_or_default(),
        );
        let cache = open_cache(config);
        let clock = SystemClock;
        let options = IndexingOptions {
            skip_removed_files_during_refresh: config.library.skip_removed_files_during_refresh,
            download_missing_album_covers: config.library.download_missing_album_covers,
        };

        let (sink, mut receiver) = ChannelSink::new();
        let printer = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    IndexingMessage::Refreshing => println!("Refreshing collection..."),
                    IndexingMessage::AddingTracks { count, percent } => {
                        println!("Added {count} tracks ({percent}%)")
                    }
                    IndexingMessage::UpdatingTracks => println!("Updating tracks..."),
                    IndexingMessage::UpdatingAlbumArtwork => println!("Updating album artwork..."),
                    IndexingMessage::Dismiss => {}
                }
            }
        });

        let report = {
            let indexer = Indexer::new(
                &repository,
                &extractor,
                &provider,
                &cache,
                &sink,
                &clock,
                options,
            );
            if artwork_only {
                indexer.index_album_artwork_only().await?
            } else if force {
                indexer.index_collection_always().await?
            } else {
                indexer.index_collection_if_outdated().await?
            }
        };

        drop(sink);
        let _ = printer.await;

        print_report(&report, artwork_only);
        Ok(())
    })
}

fn print_report(report: &IndexingReport, artwork_only: bool) {
    if !artwork_only {
        if !report.collection_outdated {
            println!("Collection is up to date.");
            return;
        }
        println!(
            "Tracks: {} added, {} updated, {} removed ({} failures)",
            report.addition.added,
            report.update.updated,
            report.removal.missing_folder_tracks + report.removal.missing_file_tracks,
            report.addition.failures.len() + report.update.failures.len()
                + report.removal.failures.len(),
        );
        if report.scan_errors > 0 {
            println!("Walk errors: {}", report.scan_errors);
        }
    }
    println!(
        "Artwork: {} resolved, {} unresolved, {} orphaned files deleted",
        report.artwork.added, report.artwork.unresolved, report.artwork.orphan_files_removed,
    );
}

fn cmd_folders_add(rt: &Runtime, config: &Config, path: &PathBuf) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let canonical = std::fs::canonicalize(path)?;
        let canonical = canonical.to_string_lossy();

        if repository.folder_by_path(&canonical).await?.is_some() {
            println!("Folder already added: {canonical}");
            return Ok(());
        }

        let folder = repository.add_folder(&canonical).await?;
        println!("Added folder {} ({})", folder.path, folder.folder_id);
        Ok(())
    })
}

fn cmd_folders_remove(rt: &Runtime, config: &Config, path: &PathBuf) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let lookup = std::fs::canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path.to_string_lossy().into_owned());

        match repository.folder_by_path(&lookup).await? {
            Some(folder) => {
                repository.remove_folder(folder.folder_id).await?;
                println!("Removed folder {}", folder.path);
                println!("Its tracks will be cleaned up on the next index run.");
            }
            None => println!("No such folder: {lookup}"),
        }
        Ok(())
    })
}

fn cmd_folders_list(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let folders = repository.folders().await?;
        if folders.is_empty() {
            println!("No folders configured. Add one with: chorale folders add <path>");
            return Ok(());
        }
        for folder in folders {
            println!("{}", folder.path);
        }
        Ok(())
    })
}

fn cmd_status(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let folders = repository.folders().await?;
        let outcome = scanner::collect_indexable_paths(&folders);

        let track_count = repository.track_count().await?;
        let pending = repository.needs_indexing_count().await?;
        let outdated = CollectionChecker::new(&repository)
            .is_collection_outdated(&outcome.paths)
            .await?;

        println!("Folders:          {}", folders.len());
        println!("Files on disk:    {}", outcome.paths.len());
        println!("Tracks indexed:   {track_count}");
        println!("Pending indexing: {pending}");
        if !outcome.errors.is_empty() {
            println!("Walk errors:      {}", outcome.errors.len());
        }
        println!(
            "Collection is {}.",
            if outdated { "outdated" } else { "up to date" }
        );
        Ok(())
    })
}

fn cmd_artwork_gc(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let repository = open_repository(config).await?;
        let cache = open_cache(config);

        let referenced: std::collections::HashSet<String> = repository
            .album_artworks()
            .await?
            .into_iter()
            .map(|a| a.artwork_id)
            .collect();

        let mut deleted = 0usize;
        for cached_id in cache.cached_ids() {
            if referenced.contains(&cached_id) {
                continue;
            }
            match cache.remove(&cached_id) {
                Ok(()) => deleted += 1,
                Err(e) => eprintln!("Failed to delete {cached_id}: {e}"),
            }
        }

        println!("Deleted {deleted} orphaned artwork files.");
        Ok(())
    })
}
