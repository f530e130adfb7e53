//! Collection indexing pipeline.
//!
//! One pass walks the configured folders, reconciles the track table
//! against what is on disk (remove, then update, then add), and then
//! reconciles album artwork. The pass runs sequentially in a single
//! worker; progress flows out through a fire-and-forget
//! [`NotificationSink`] and per-item failures are accumulated into
//! reports instead of aborting the batch. A failing phase is logged at
//! its boundary and the next phase still runs.

pub mod adder;
pub mod collection;
pub mod filler;
pub mod progress;
pub mod remover;
pub mod updater;
pub mod verifier;

pub use adder::{AdditionReport, TrackAdder};
pub use collection::CollectionChecker;
pub use filler::TrackFiller;
pub use progress::{ChannelSink, IndexingMessage, NotificationSink};
pub use remover::{RemovalReport, TrackRemover};
pub use updater::{TrackUpdater, UpdateReport};

use std::time::Instant;

use tracing::{error, info};

use crate::artwork::cache::ArtworkCache;
use crate::artwork::indexer::{AlbumArtworkIndexer, ArtworkReport};
use crate::artwork::online::AlbumInfoProvider;
use crate::artwork::resolver::ArtworkResolver;
use crate::error::Result;
use crate::metadata::MetadataExtractor;
use crate::model::IndexablePath;
use crate::repository::Repository;
use crate::scanner;
use crate::ticks::Clock;

/// One item (a path or an album key) that failed inside a batch.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item: String,
    pub message: String,
}

/// Aggregate outcome of one full indexing pass.
#[derive(Debug, Default)]
pub struct IndexingReport {
    /// Whether the collection check decided a pass was needed. Always
    /// true for forced passes.
    pub collection_outdated: bool,
    /// Indexable paths found on disk
    pub paths_on_disk: usize,
    /// Walk errors, none fatal
    pub scan_errors: usize,
    pub removal: RemovalReport,
    pub update: UpdateReport,
    pub addition: AdditionReport,
    pub artwork: ArtworkReport,
}

/// Behavior toggles for the indexing pass, read from configuration.
#[derive(Debug, Clone, Copy)]
pub struct IndexingOptions {
    /// Do not re-add previously removed files
    pub skip_removed_files_during_refresh: bool,
    /// Allow the online artwork source
    pub download_missing_album_covers: bool,
}

/// Orchestrates the remove, update, add phases over the track table.
pub struct TrackIndexer<'a> {
    remover: TrackRemover<'a>,
    updater: TrackUpdater<'a>,
    adder: TrackAdder<'a>,
}

impl<'a> TrackIndexer<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        filler: &'a TrackFiller<'a>,
        sink: &'a dyn NotificationSink,
        clock: &'a dyn Clock,
        options: IndexingOptions,
    ) -> Self {
        Self {
            remover: TrackRemover::new(repository, sink, clock),
            updater: TrackUpdater::new(repository, filler, sink),
            adder: TrackAdder::new(
                repository,
                filler,
                sink,
                clock,
                options.skip_removed_files_during_refresh,
            ),
        }
    }

    /// Run the three reconciliation phases in order. A phase failing at
    /// its boundary is logged and the remaining phases still run.
    pub async fn index_tracks(&self, paths: &[IndexablePath], report: &mut IndexingReport) {
        let started = Instant::now();

        match self.remover.remove().await {
            Ok(removal) => report.removal = removal,
            Err(e) => error!(error = %e, "track removal phase failed"),
        }
        match self.updater.update_outdated_tracks().await {
            Ok(update) => report.update = update,
            Err(e) => error!(error = %e, "track update phase failed"),
        }
        match self.adder.add_new_tracks(paths).await {
            Ok(addition) => report.addition = addition,
            Err(e) => error!(error = %e, "track addition phase failed"),
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexed tracks"
        );
    }
}

/// Top-level entry point: collection check, track indexing, artwork
/// indexing, each at most once per call.
pub struct Indexer<'a> {
    repository: &'a dyn Repository,
    extractor: &'a dyn MetadataExtractor,
    provider: &'a dyn AlbumInfoProvider,
    cache: &'a ArtworkCache,
    sink: &'a dyn NotificationSink,
    clock: &'a dyn Clock,
    options: IndexingOptions,
}

impl<'a> Indexer<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        extractor: &'a dyn MetadataExtractor,
        provider: &'a dyn AlbumInfoProvider,
        cache: &'a ArtworkCache,
        sink: &'a dyn NotificationSink,
        clock: &'a dyn Clock,
        options: IndexingOptions,
    ) -> Self {
        Self {
            repository,
            extractor,
            provider,
            cache,
            sink,
            clock,
            options,
        }
    }

    /// Run a full pass only when the collection check says the database
    /// disagrees with the disk.
    pub async fn index_collection_if_outdated(&self) -> Result<IndexingReport> {
        self.index_collection(false).await
    }

    /// Run a full pass unconditionally.
    pub async fn index_collection_always(&self) -> Result<IndexingReport> {
        self.index_collection(true).await
    }

    async fn index_collection(&self, force: bool) -> Result<IndexingReport> {
        let started = Instant::now();
        let mut report = IndexingReport::default();

        let folders = self.repository.folders().await?;
        let outcome = scanner::collect_indexable_paths(&folders);
        report.paths_on_disk = outcome.paths.len();
        report.scan_errors = outcome.errors.len();

        report.collection_outdated = if force {
            true
        } else {
            CollectionChecker::new(self.repository)
                .is_collection_outdated(&outcome.paths)
                .await?
        };

        if report.collection_outdated {
            let filler = TrackFiller::new(self.extractor);
            let track_indexer =
                TrackIndexer::new(self.repository, &filler, self.sink, self.clock, self.options);
            track_indexer
                .index_tracks(&outcome.paths, &mut report)
                .await;

            self.run_artwork_phase(&mut report).await;
        } else {
            info!("collection is up to date");
        }

        self.sink.notify(IndexingMessage::Dismiss);
        info!(
            outdated = report.collection_outdated,
            paths = report.paths_on_disk,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexing pass finished"
        );
        Ok(report)
    }

    /// Reconcile album artwork without touching the track table.
    pub async fn index_album_artwork_only(&self) -> Result<IndexingReport> {
        let mut report = IndexingReport::default();
        self.run_artwork_phase(&mut report).await;
        self.sink.notify(IndexingMessage::Dismiss);
        Ok(report)
    }

    async fn run_artwork_phase(&self, report: &mut IndexingReport) {
        let resolver =
            ArtworkResolver::new(self.provider, self.options.download_missing_album_covers);
        let artwork_indexer = AlbumArtworkIndexer::new(
            self.repository,
            self.extractor,
            &resolver,
            self.cache,
            self.sink,
        );
        match artwork_indexer.index_album_artwork().await {
            Ok(artwork) => report.artwork = artwork,
            Err(e) => error!(error = %e, "artwork indexing phase failed"),
        }
    }
}
