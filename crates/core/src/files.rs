//! Candidate file enumeration: directory walks and bundler asset lists

use crate::compilation::Compilation;
use crate::error::{Error, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A candidate file for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Name the filter patterns are tested against
    pub name: String,
    /// Location on disk
    pub path: PathBuf,
}

impl File {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build a file from a walked path, named after its base name.
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

/// Exclusion globs applied while walking a directory.
///
/// A glob without a `/` is matched against the entry's base name, any other
/// glob against the full path. Entries that are not valid globs are skipped
/// here; they still take part in name filtering.
#[derive(Debug, Clone, Default)]
pub struct WalkExcludes {
    patterns: Vec<Pattern>,
}

impl WalkExcludes {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p.as_ref()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    debug!(pattern = p.as_ref(), error = %e, "Not a glob, skipped by walker");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| {
            if pattern.as_str().contains('/') {
                pattern.matches_path(path)
            } else {
                path.file_name()
                    .map(|name| pattern.matches(&name.to_string_lossy()))
                    .unwrap_or(false)
            }
        })
    }
}

/// Recursively list regular files under `root`, pruning excluded entries.
pub fn walk_directory(root: &Path, excludes: &WalkExcludes) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !excludes.is_excluded(entry.path()));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| Error::Enumeration {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// Enumerate a directory on the blocking pool.
pub async fn enumerate_directory(root: PathBuf, excludes: WalkExcludes) -> Result<Vec<File>> {
    let paths = tokio::task::spawn_blocking(move || walk_directory(&root, &excludes)).await??;
    Ok(paths.into_iter().map(File::from_path).collect())
}

/// Files the bundler already emitted, named by asset key.
pub fn asset_files(compilation: &Compilation) -> Vec<File> {
    compilation
        .assets()
        .iter()
        .map(|(name, asset)| File::new(name.clone(), asset.exists_at.clone()))
        .collect()
}
