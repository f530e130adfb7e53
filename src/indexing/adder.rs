//! Addition phase of track reconciliation.
//!
//! Computes the indexable paths not yet in the track table, fills each
//! one via [`TrackFiller`], inserts the row, and records its folder.
//! Previously removed paths are skipped when
//! `skip_removed_files_during_refresh` is set ("skip" means "do not
//! re-add"). Progress is batched: an `AddingTracks` notification every 20
//! successfully added tracks, and once more at 100%.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{IndexablePath, Track};
use crate::repository::Repository;
use crate::ticks::Clock;

use super::ItemFailure;
use super::filler::TrackFiller;
use super::progress::{IndexingMessage, NotificationSink};

/// Notification batch size.
const NOTIFY_EVERY: usize = 20;

/// Outcome of the addition phase.
#[derive(Debug, Default)]
pub struct AdditionReport {
    /// Tracks inserted
    pub added: usize,
    /// Candidates skipped because they are tombstoned
    pub skipped_removed: usize,
    /// Per-item failures, none of which stopped the phase
    pub failures: Vec<ItemFailure>,
}

/// Track addition phase.
pub struct TrackAdder<'a> {
    repository: &'a dyn Repository,
    filler: &'a TrackFiller<'a>,
    sink: &'a dyn NotificationSink,
    clock: &'a dyn Clock,
    skip_removed_files: bool,
}

impl<'a> TrackAdder<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        filler: &'a TrackFiller<'a>,
        sink: &'a dyn NotificationSink,
        clock: &'a dyn Clock,
        skip_removed_files: bool,
    ) -> Self {
        Self {
            repository,
            filler,
            sink,
            clock,
            skip_removed_files,
        }
    }

    /// Insert every indexable path not already in the track table.
    pub async fn add_new_tracks(&self, paths: &[IndexablePath]) -> Result<AdditionReport> {
        let started = Instant::now();
        let mut report = AdditionReport::default();

        let existing: HashSet<String> = self
            .repository
            .all_tracks()
            .await?
            .into_iter()
            .map(|t| t.path)
            .collect();

        let tombstoned: HashSet<String> = if self.skip_removed_files {
            self.repository
                .removed_tracks()
                .await?
                .into_iter()
                .map(|r| r.path)
                .collect()
        } else {
            HashSet::new()
        };

        let candidates: Vec<&IndexablePath> = paths
            .iter()
            .filter(|p| {
                let path = p.path.to_string_lossy();
                if existing.contains(path.as_ref()) {
                    return false;
                }
                if tombstoned.contains(path.as_ref()) {
                    report.skipped_removed += 1;
                    return false;
                }
                true
            })
            .collect();

        let total = candidates.len();
        for candidate in candidates {
            match self.add_one(candidate).await {
                Ok(()) => {
                    report.added += 1;
                    if report.added % NOTIFY_EVERY == 0 {
                        self.notify_progress(report.added, total);
                    }
                }
                Err(e) => {
                    let path = candidate.path.to_string_lossy().to_string();
                    warn!(path = %path, error = %e, "failed to add track");
                    report.failures.push(ItemFailure {
                        item: path,
                        message: e.to_string(),
                    });
                }
            }
        }

        // Completion always reads 100, even when failed candidates mean
        // the last batch notification stopped short of it.
        if report.added > 0 && (report.added % NOTIFY_EVERY != 0 || report.added != total) {
            self.sink.notify(IndexingMessage::AddingTracks {
                count: report.added,
                percent: 100,
            });
        }

        info!(
            added = report.added,
            skipped = report.skipped_removed,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "added new tracks"
        );
        Ok(report)
    }

    async fn add_one(&self, indexable: &IndexablePath) -> Result<()> {
        let path = indexable.path.to_string_lossy().to_string();

        let mut track = Track::new(&path);
        track.date_added = self.clock.now_ticks();
        self.filler.fill(&mut track, false);

        self.repository.add_track(&track).await?;
        let saved = self
            .repository
            .track_by_path(&path)
            .await?
            .ok_or_else(|| crate::error::Error::not_found(format!("freshly added track {path}")))?;
        self.repository
            .add_folder_track(indexable.folder_id, saved.track_id)
            .await?;
        Ok(())
    }

    fn notify_progress(&self, count: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            (count * 100 / total) as u32
        };
        self.sink
            .notify(IndexingMessage::AddingTracks { count, percent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::progress::RecordingSink;
    use crate::metadata::{FakeExtractor, FileMetadata};
    use crate::model::RemovedTrack;
    use crate::repository::memory::MemoryRepository;
    use crate::ticks::FixedClock;
    use tempfile::TempDir;

    fn indexable(path: &std::path::Path, folder_id: i64) -> IndexablePath {
        IndexablePath {
            path: path.to_path_buf(),
            date_modified_ticks: 1,
            folder_id,
        }
    }

    fn write_audio(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"audio").unwrap();
        path
    }

    #[tokio::test]
    async fn test_adds_new_tracks_with_folder_rows() {
        let temp = TempDir::new().unwrap();
        let a = write_audio(&temp, "a.mp3");
        let b = write_audio(&temp, "b.mp3");

        let repo = MemoryRepository::new();
        let extractor = FakeExtractor::new();
        for path in [&a, &b] {
            extractor.insert(
                path.clone(),
                FileMetadata {
                    title: Some("T".to_string()),
                    album: Some("Album".to_string()),
                    album_artists: vec!["AA".to_string()],
                    ..FileMetadata::default()
                },
            );
        }

        let sink = RecordingSink::new();
        let clock = FixedClock(555);
        let filler = TrackFiller::new(&extractor);
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);

        let report = adder
            .add_new_tracks(&[indexable(&a, 1), indexable(&b, 1)])
            .await
            .unwrap();

        assert_eq!(report.added, 2);
        assert_eq!(repo.track_count().await.unwrap(), 2);
        assert_eq!(repo.folder_tracks().await.unwrap().len(), 2);

        let saved = repo
            .track_by_path(&a.to_string_lossy())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.needs_indexing, Some(0));
        assert_eq!(saved.indexing_success, Some(1));
        assert_eq!(saved.date_added, 555);

        // Fewer than 20 adds: only the completion notification.
        assert_eq!(
            sink.messages(),
            vec![IndexingMessage::AddingTracks {
                count: 2,
                percent: 100
            }]
        );
    }

    #[tokio::test]
    async fn test_existing_tracks_not_re_added() {
        let temp = TempDir::new().unwrap();
        let a = write_audio(&temp, "a.mp3");
        let path = a.to_string_lossy().to_string();

        let repo = MemoryRepository::new();
        repo.add_track(&Track::new(&path)).await.unwrap();

        let extractor = FakeExtractor::new();
        let sink = RecordingSink::new();
        let clock = FixedClock(0);
        let filler = TrackFiller::new(&extractor);
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);

        let report = adder.add_new_tracks(&[indexable(&a, 1)]).await.unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(repo.track_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tombstoned_paths_skipped_when_configured() {
        let temp = TempDir::new().unwrap();
        let a = write_audio(&temp, "a.mp3");
        let path = a.to_string_lossy().to_string();

        let repo = MemoryRepository::new();
        repo.add_removed_track(&RemovedTrack {
            track_id: 1,
            path: path.clone(),
            safe_path: path.to_lowercase(),
            date_removed: 1,
        })
        .await
        .unwrap();

        let extractor = FakeExtractor::new();
        let sink = RecordingSink::new();
        let clock = FixedClock(0);
        let filler = TrackFiller::new(&extractor);

        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);
        let report = adder.add_new_tracks(&[indexable(&a, 1)]).await.unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.skipped_removed, 1);

        // With the policy off, the path is re-addable.
        extractor.insert(a.clone(), FileMetadata::default());
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, false);
        let report = adder.add_new_tracks(&[indexable(&a, 1)]).await.unwrap();
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_inserts_stamped_row() {
        let temp = TempDir::new().unwrap();
        let bad = write_audio(&temp, "bad.mp3");

        let repo = MemoryRepository::new();
        // No fake record: extraction fails, but the row is still inserted
        // with the failure stamped on it.
        let extractor = FakeExtractor::new();
        let sink = RecordingSink::new();
        let clock = FixedClock(0);
        let filler = TrackFiller::new(&extractor);
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);

        let report = adder.add_new_tracks(&[indexable(&bad, 1)]).await.unwrap();
        assert_eq!(report.added, 1);

        let saved = repo
            .track_by_path(&bad.to_string_lossy())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.indexing_success, Some(0));
        assert_eq!(saved.needs_indexing, Some(1));
    }

    #[tokio::test]
    async fn test_completion_notification_reads_full_even_with_failures() {
        let temp = TempDir::new().unwrap();
        let repo = MemoryRepository::new();
        let extractor = FakeExtractor::new();

        let mut paths = Vec::new();
        for i in 0..20 {
            let p = write_audio(&temp, &format!("{i}.mp3"));
            extractor.insert(p.clone(), FileMetadata::default());
            paths.push(indexable(&p, 1));
        }
        // A duplicate of the first path fails its insert, so 21 candidates
        // yield 20 adds.
        paths.push(paths[0].clone());

        let sink = RecordingSink::new();
        let clock = FixedClock(0);
        let filler = TrackFiller::new(&extractor);
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);

        let report = adder.add_new_tracks(&paths).await.unwrap();
        assert_eq!(report.added, 20);
        assert_eq!(report.failures.len(), 1);

        assert_eq!(
            sink.messages(),
            vec![
                IndexingMessage::AddingTracks {
                    count: 20,
                    percent: 95
                },
                IndexingMessage::AddingTracks {
                    count: 20,
                    percent: 100
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_notifications_batched_every_twenty() {
        let temp = TempDir::new().unwrap();
        let repo = MemoryRepository::new();
        let extractor = FakeExtractor::new();

        let mut paths = Vec::new();
        for i in 0..45 {
            let p = write_audio(&temp, &format!("{i}.mp3"));
            extractor.insert(p.clone(), FileMetadata::default());
            paths.push(indexable(&p, 1));
        }

        let sink = RecordingSink::new();
        let clock = FixedClock(0);
        let filler = TrackFiller::new(&extractor);
        let adder = TrackAdder::new(&repo, &filler, &sink, &clock, true);

        let report = adder.add_new_tracks(&paths).await.unwrap();
        assert_eq!(report.added, 45);

        // Batches at 20 and 40, plus the completion notification.
        assert_eq!(
            sink.messages(),
            vec![
                IndexingMessage::AddingTracks {
                    count: 20,
                    percent: 44
                },
                IndexingMessage::AddingTracks {
                    count: 40,
                    percent: 88
                },
                IndexingMessage::AddingTracks {
                    count: 45,
                    percent: 100
                },
            ]
        );
    }
}
