//! External artwork: cover image files next to the audio file.
//!
//! Matches a fixed, case-insensitive pattern set in priority order:
//! `front.*`, `cover.*`, `folder.*`, then `<audio file stem>.*`, each over
//! png/jpg/jpeg. The first match in pattern-list order wins.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Cover file stems, in priority order.
const COVER_STEMS: &[&str] = &["front", "cover", "folder"];

/// Supported image extensions, in priority order.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Find and load a cover image in the audio file's directory.
pub fn find_external_artwork(audio_path: &Path) -> Option<Vec<u8>> {
    let parent = audio_path.parent()?;

    // Lowercased (stem, ext) pairs of every file in the directory, so
    // FRONT.JPG matches the front.jpg pattern.
    let entries = read_image_entries(parent);

    let audio_stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let mut stems: Vec<&str> = COVER_STEMS.to_vec();
    if let Some(ref stem) = audio_stem {
        stems.push(stem);
    }

    for stem in stems {
        for ext in IMAGE_EXTENSIONS {
            if let Some(path) = entries
                .iter()
                .find(|(s, e, _)| s == stem && e == ext)
                .map(|(_, _, p)| p)
            {
                match std::fs::read(path) {
                    Ok(bytes) => return Some(bytes),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to read cover file");
                        continue;
                    }
                }
            }
        }
    }

    None
}

fn read_image_entries(dir: &Path) -> Vec<(String, String, PathBuf)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if !path.is_file() {
                return None;
            }
            let stem = path.file_stem()?.to_str()?.to_lowercase();
            let ext = path.extension()?.to_str()?.to_lowercase();
            Some((stem, ext, path))
        })
        .collect()
}
