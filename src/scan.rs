//! Discovery of the ordered image-source list fed to the atlas builder.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Configuration;
use crate::error::Error;

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    let exts: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| *e == ext)
        })
}

/// Collect the ordered list of image locators: the library directory walk
/// (sorted for a stable order) followed by the explicit `image-paths`.
///
/// The list may legitimately be empty; a gallery with nothing to show is a
/// valid degraded state, not an error.
///
/// # Errors
/// Returns [`Error::BadDir`] if the configured library path is missing or
/// not a directory.
pub fn collect_image_paths(cfg: &Configuration) -> Result<Vec<PathBuf>, Error> {
    let mut out = Vec::new();

    if let Some(root) = &cfg.photo_library_path {
        if !root.exists() || !root.is_dir() {
            return Err(Error::BadDir(root.to_string_lossy().into_owned()));
        }

        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !should_skip_dir(e))
            .flatten()
            .filter(|e| e.path().is_file() && is_supported_image(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        found.sort();
        out.append(&mut found);
    }

    out.extend(cfg.image_paths.iter().cloned());
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    // Skip typical hidden dot-directories like .git, .idea, etc.
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
