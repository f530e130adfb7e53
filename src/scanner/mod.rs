//! Folder walking: turns configured folders into indexable paths.
//!
//! Walks every existing scan root recursively with `walkdir`, filters to
//! supported audio extensions, and returns one [`IndexablePath`] per
//! match. Individual traversal failures (permissions, files vanishing
//! mid-walk) are collected and the walk continues; a folder whose root no
//! longer exists is silently skipped. Symlinks are not followed, so
//! symlink cycles cannot occur.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::model::{Folder, IndexablePath};
use crate::ticks;

/// Supported audio extensions (case-insensitive).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "m4a", "opus", "wav"];

/// A single traversal failure. Never fatal to the walk.
#[derive(Debug)]
pub struct ScanError {
    /// The path that failed, when known
    pub path: Option<PathBuf>,
    /// Human-readable failure description
    pub message: String,
}

/// Result of walking all configured folders.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every audio file found, with its modified time and owning folder
    pub paths: Vec<IndexablePath>,
    /// Collected per-entry failures
    pub errors: Vec<ScanError>,
}

/// Check whether a path has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Walk every existing folder and collect its indexable paths.
pub fn collect_indexable_paths(folders: &[Folder]) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for folder in folders {
        let root = Path::new(&folder.path);
        if !root.exists() {
            debug!(folder = %folder.path, "folder root missing, skipping");
            continue;
        }
        walk_folder(root, folder.folder_id, &mut outcome);
    }

    outcome
}

fn walk_folder(root: &Path, folder_id: i64, outcome: &mut ScanOutcome) {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                outcome.errors.push(ScanError {
                    path: e.path().map(|p| p.to_path_buf()),
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_audio_file(entry.path()) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                let modified = metadata
                    .modified()
                    .map(ticks::system_time_to_ticks)
                    .unwrap_or(0);
                outcome.paths.push(IndexablePath {
                    path: entry.path().to_path_buf(),
                    date_modified_ticks: modified,
                    folder_id,
                });
            }
            Err(e) => {
                outcome.errors.push(ScanError {
                    path: Some(entry.path().to_path_buf()),
                    message: e.to_string(),
                });
            }
        }
    }
}
