//! Removal phase of track reconciliation.
//!
//! Runs first so orphan cleanup happens before any metadata work. Three
//! sub-steps, each independently timed and logged:
//!
//! 1. delete tracks whose folder_track points at a removed folder
//! 2. delete tracks whose file no longer exists on disk (tombstoned)
//! 3. delete folder_track rows whose track no longer exists
//!
//! A single `Refreshing` notification fires the first time any sub-step
//! finds work, not once per deleted row.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::Result;
use crate::model::RemovedTrack;
use crate::repository::Repository;
use crate::ticks::Clock;

use super::ItemFailure;
use super::progress::{IndexingMessage, NotificationSink};

/// Outcome of the removal phase.
#[derive(Debug, Default)]
pub struct RemovalReport {
    /// Tracks deleted because their folder is gone
    pub missing_folder_tracks: u64,
    /// Tracks deleted because their file is gone
    pub missing_file_tracks: u64,
    /// Orphaned folder_track rows deleted
    pub orphaned_folder_tracks: u64,
    /// Per-item failures, none of which stopped the phase
    pub failures: Vec<ItemFailure>,
}

/// Track removal phase.
pub struct TrackRemover<'a> {
    repository: &'a dyn Repository,
    sink: &'a dyn NotificationSink,
    clock: &'a dyn Clock,
}

impl<'a> TrackRemover<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        sink: &'a dyn NotificationSink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            repository,
            sink,
            clock,
        }
    }

    /// Run all three removal sub-steps.
    pub async fn remove(&self) -> Result<RemovalReport> {
        let mut report = RemovalReport::default();
        let mut notified = false;

        self.remove_tracks_in_missing_folders(&mut report, &mut notified)
            .await?;
        self.remove_tracks_not_on_disk(&mut report, &mut notified)
            .await?;
        self.remove_orphaned_folder_tracks(&mut report, &mut notified)
            .await?;

        Ok(report)
    }

    async fn remove_tracks_in_missing_folders(
        &self,
        report: &mut RemovalReport,
        notified: &mut bool,
    ) -> Result<()> {
        let started = Instant::now();
        let deleted = self.repository.delete_tracks_in_missing_folders().await?;
        if deleted > 0 {
            self.notify_once(notified);
        }
        report.missing_folder_tracks = deleted;
        info!(
            deleted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "removed tracks of missing folders"
        );
        Ok(())
    }

    async fn remove_tracks_not_on_disk(
        &self,
        report: &mut RemovalReport,
        notified: &mut bool,
    ) -> Result<()> {
        let started = Instant::now();

        for track in self.repository.all_tracks().await? {
            if Path::new(&track.path).exists() {
                continue;
            }

            self.notify_once(notified);

            let tombstone = RemovedTrack::from_track(&track, self.clock.now_ticks());
            if let Err(e) = self.repository.add_removed_track(&tombstone).await {
                warn!(path = %track.path, error = %e, "failed to record tombstone");
                report.failures.push(ItemFailure {
                    item: track.path.clone(),
                    message: e.to_string(),
                });
            }

            match self.repository.delete_track(track.track_id).await {
                Ok(()) => report.missing_file_tracks += 1,
                Err(e) => {
                    warn!(path = %track.path, error = %e, "failed to delete missing track");
                    report.failures.push(ItemFailure {
                        item: track.path,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            deleted = report.missing_file_tracks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "removed tracks missing on disk"
        );
        Ok(())
    }

    async fn remove_orphaned_folder_tracks(
        &self,
        report: &mut RemovalReport,
        notified: &mut bool,
    ) -> Result<()> {
        let started = Instant::now();
        let deleted = self.repository.delete_orphaned_folder_tracks().await?;
        if deleted > 0 {
            self.notify_once(notified);
        }
        report.orphaned_folder_tracks = deleted;
        info!(
            deleted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "removed orphaned folder track rows"
        );
        Ok(())
    }

    fn notify_once(&self, notified: &mut bool) {
        if !*notified {
            self.sink.notify(IndexingMessage::Refreshing);
            *notified = true;
        }
    }
}
