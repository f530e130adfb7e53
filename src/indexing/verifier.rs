//! Staleness checks for persisted tracks.

use crate::model::Track;

/// Whether a track must be (re)scanned. True unless the flag is exactly 0:
/// an unset flag means the track was never indexed.
pub fn needs_indexing(track: &Track) -> bool {
    track.needs_indexing != Some(0)
}

/// Whether the persisted state diverges from the live file.
///
/// A persisted size of 0 always counts as out of date; otherwise the
/// persisted size and modified time must both match the filesystem.
pub fn is_out_of_date(track: &Track, live_file_size: i64, live_date_modified: i64) -> bool {
    track.file_size == 0
        || track.file_size != live_file_size
        || track.date_file_modified != live_date_modified
}
