//! Update phase of track reconciliation.
//!
//! Re-extracts metadata for every track that still needs indexing or
//! whose file diverged from its persisted size/modified time. A single
//! `UpdatingTracks` notification fires when the first stale track is
//! found, whether or not its update succeeds. A
//! per-track failure is logged and skipped; the row keeps its previous
//! persisted state.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::Result;
use crate::repository::Repository;
use crate::ticks;

use super::ItemFailure;
use super::filler::TrackFiller;
use super::progress::{IndexingMessage, NotificationSink};
use super::verifier;

/// Outcome of the update phase.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Tracks whose metadata was re-extracted and persisted
    pub updated: usize,
    /// Per-item failures, none of which stopped the phase
    pub failures: Vec<ItemFailure>,
}

/// Track update phase.
pub struct TrackUpdater<'a> {
    repository: &'a dyn Repository,
    filler: &'a TrackFiller<'a>,
    sink: &'a dyn NotificationSink,
}

impl<'a> TrackUpdater<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        filler: &'a TrackFiller<'a>,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            repository,
            filler,
            sink,
        }
    }

    /// Re-index every stale track.
    pub async fn update_outdated_tracks(&self) -> Result<UpdateReport> {
        let started = Instant::now();
        let mut report = UpdateReport::default();
        let mut notified = false;

        for mut track in self.repository.all_tracks().await? {
            if !self.track_is_stale(&track) {
                continue;
            }

            if !notified {
                self.sink.notify(IndexingMessage::UpdatingTracks);
                notified = true;
            }

            self.filler.fill(&mut track, false);
            match self.repository.update_track(&track).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(path = %track.path, error = %e, "failed to update track");
                    report.failures.push(ItemFailure {
                        item: track.path,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            updated = report.updated,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "updated outdated tracks"
        );
        Ok(report)
    }

    fn track_is_stale(&self, track: &crate::model::Track) -> bool {
        if verifier::needs_indexing(track) {
            return true;
        }

        match std::fs::metadata(Path::new(&track.path)) {
            Ok(metadata) => {
                let live_modified = metadata
                    .modified()
                    .map(ticks::system_time_to_ticks)
                    .unwrap_or(0);
                verifier::is_out_of_date(track, metadata.len() as i64, live_modified)
            }
            // Missing files are the remover's job, not ours.
            Err(_) => false,
        }
    }
}
