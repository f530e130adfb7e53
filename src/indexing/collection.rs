//! Cheap "does the library need indexing at all" check.

use tracing::debug;

use crate::error::Result;
use crate::model::IndexablePath;
use crate::repository::Repository;

/// Decides whether a full indexing pass is warranted.
pub struct CollectionChecker<'a> {
    repository: &'a dyn Repository,
}

impl<'a> CollectionChecker<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }

    /// True when the database disagrees with what is on disk.
    ///
    /// Outdated when any track is flagged for re-indexing, when the
    /// number of files on disk differs from the number of rows, or when
    /// a file on disk is newer than the newest recorded modification.
    pub async fn is_collection_outdated(&self, paths: &[IndexablePath]) -> Result<bool> {
        let flagged = self.repository.needs_indexing_count().await?;
        if flagged > 0 {
            debug!(flagged, "collection outdated: tracks flagged for indexing");
            return Ok(true);
        }

        let track_count = self.repository.track_count().await?;
        if paths.len() as i64 != track_count {
            debug!(
                on_disk = paths.len(),
                in_database = track_count,
                "collection outdated: track count mismatch"
            );
            return Ok(true);
        }

        let newest_on_disk = paths.iter().map(|p| p.date_modified_ticks).max().unwrap_or(0);
        let newest_in_database = self.repository.max_date_file_modified().await?;
        if newest_on_disk > newest_in_database {
            debug!(
                newest_on_disk,
                newest_in_database, "collection outdated: newer files on disk"
            );
            return Ok(true);
        }

        Ok(false)
    }
}
