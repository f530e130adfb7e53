//! Album artwork reconciliation.
//!
//! Runs after track reconciliation, in a fixed order: delete orphaned
//! artwork rows, delete rows for albums flagged for re-resolution, then
//! resolve artwork for every album key that has none, and finally delete
//! cached files no row references. One album failing never stops the
//! pass. An `UpdatingAlbumArtwork` notification fires the first time each
//! phase finds work.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::indexing::ItemFailure;
use crate::indexing::progress::{IndexingMessage, NotificationSink};
use crate::metadata::MetadataExtractor;
use crate::model::AlbumArtwork;
use crate::repository::Repository;

use super::cache::ArtworkCache;
use super::resolver::ArtworkResolver;

/// Outcome of one artwork reconciliation pass.
#[derive(Debug, Default)]
pub struct ArtworkReport {
    /// Artwork rows deleted because no track matches their album key
    pub orphaned_rows_removed: u64,
    /// Artwork rows deleted because their album was flagged for re-resolution
    pub flagged_rows_removed: u64,
    /// Albums that gained an artwork row
    pub added: usize,
    /// Albums whose resolution chain found nothing
    pub unresolved: usize,
    /// Cached files deleted during disk reconciliation
    pub orphan_files_removed: usize,
    /// Per-album failures, none of which stopped the pass
    pub failures: Vec<ItemFailure>,
}

/// Album artwork reconciliation pass.
pub struct AlbumArtworkIndexer<'a> {
    repository: &'a dyn Repository,
    extractor: &'a dyn MetadataExtractor,
    resolver: &'a ArtworkResolver<'a>,
    cache: &'a ArtworkCache,
    sink: &'a dyn NotificationSink,
}

impl<'a> AlbumArtworkIndexer<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        extractor: &'a dyn MetadataExtractor,
        resolver: &'a ArtworkResolver<'a>,
        cache: &'a ArtworkCache,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            repository,
            extractor,
            resolver,
            cache,
            sink,
        }
    }

    /// Reconcile artwork rows and the on-disk cache with the track table.
    pub async fn index_album_artwork(&self) -> Result<ArtworkReport> {
        let started = Instant::now();
        let mut report = ArtworkReport::default();

        self.remove_artwork(&mut report).await?;
        self.add_artwork(&mut report).await?;
        self.reconcile_cache_directory(&mut report).await?;

        info!(
            added = report.added,
            unresolved = report.unresolved,
            orphaned_rows = report.orphaned_rows_removed,
            flagged_rows = report.flagged_rows_removed,
            orphan_files = report.orphan_files_removed,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexed album artwork"
        );
        Ok(report)
    }

    async fn remove_artwork(&self, report: &mut ArtworkReport) -> Result<()> {
        report.orphaned_rows_removed = self.repository.delete_orphaned_album_artworks().await?;
        report.flagged_rows_removed = self
            .repository
            .delete_album_artworks_for_flagged_tracks()
            .await?;
        if report.orphaned_rows_removed + report.flagged_rows_removed > 0 {
            self.sink.notify(IndexingMessage::UpdatingAlbumArtwork);
        }
        Ok(())
    }

    async fn add_artwork(&self, report: &mut ArtworkReport) -> Result<()> {
        let album_keys = self.repository.album_keys_needing_artwork().await?;
        if !album_keys.is_empty() {
            self.sink.notify(IndexingMessage::UpdatingAlbumArtwork);
        }

        for album_key in album_keys {
            match self.add_artwork_for_album(&album_key).await {
                Ok(true) => report.added += 1,
                Ok(false) => report.unresolved += 1,
                Err(e) => {
                    warn!(album_key = %album_key, error = %e, "failed to index album artwork");
                    report.failures.push(ItemFailure {
                        item: album_key,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve and cache artwork for one album. Returns false when the
    /// resolution chain found nothing, leaving the album to be retried on
    /// a later pass.
    async fn add_artwork_for_album(&self, album_key: &str) -> Result<bool> {
        let track = self
            .repository
            .newest_track_for_album_key(album_key)
            .await?
            .ok_or_else(|| Error::not_found(format!("track for album key {album_key}")))?;

        let path = std::path::PathBuf::from(&track.path);
        let metadata = self.extractor.extract(&path)?;

        let Some(bytes) = self.resolver.resolve(&metadata, &path, true).await else {
            return Ok(false);
        };
        let Some(artwork_id) = self.cache.store(&bytes) else {
            return Ok(false);
        };

        self.repository.clear_album_artwork_flag(album_key).await?;
        self.repository
            .add_album_artwork(&AlbumArtwork {
                album_artwork_id: 0,
                album_key: album_key.to_string(),
                artwork_id: artwork_id.as_str().to_string(),
            })
            .await?;
        Ok(true)
    }

    /// Delete cached files whose id is referenced by no artwork row.
    async fn reconcile_cache_directory(&self, report: &mut ArtworkReport) -> Result<()> {
        let referenced: std::collections::HashSet<String> = self
            .repository
            .album_artworks()
            .await?
            .into_iter()
            .map(|a| a.artwork_id)
            .collect();

        let mut notified = false;
        for cached_id in self.cache.cached_ids() {
            if referenced.contains(&cached_id) {
                continue;
            }
            if !notified {
                self.sink.notify(IndexingMessage::UpdatingAlbumArtwork);
                notified = true;
            }
            match self.cache.remove(&cached_id) {
                Ok(()) => report.orphan_files_removed += 1,
                Err(e) => {
                    warn!(artwork_id = %cached_id, error = %e, "failed to delete cached artwork");
                    report.failures.push(ItemFailure {
                        item: cached_id,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
