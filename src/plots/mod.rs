//! Plot discovery
//!
//! Scans the plot directory for finished plots and yields at most one
//! transfer candidate per scan. Purely observational; no side effects.

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A plot file eligible for transfer
#[derive(Debug, Clone)]
pub struct PlotCandidate {
    /// Absolute path on the plotter
    pub path: PathBuf,
    /// Base name, used to address the file on the NAS side
    pub file_name: String,
    /// Size in bytes at discovery time
    pub size: u64,
}

/// Scans a directory for transfer candidates
#[derive(Debug, Clone)]
pub struct PlotSource {
    dir: PathBuf,
    extension: String,
    min_size: u64,
}

impl PlotSource {
    /// Create a source over `dir`, matching files with `extension` and
    /// at least `min_size` bytes.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>, min_size: u64) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            min_size,
        }
    }

    /// Find the next plot ready for transfer.
    ///
    /// Returns `Ok(None)` when the directory is empty or holds no
    /// eligible plot; an empty directory is a steady-state condition,
    /// not an error. Files below the minimum size are assumed to still
    /// be written by the plotter and are skipped. Ordering between
    /// eligible files is filesystem-dependent; callers get "some
    /// eligible plot", nothing stronger.
    pub fn discover(&self) -> Result<Option<PlotCandidate>> {
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", self.dir, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Could not stat {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if metadata.len() < self.min_size {
                tracing::debug!(
                    "{:?} is below the minimum plot size ({} < {}), still being written?",
                    entry.path(),
                    metadata.len(),
                    self.min_size
                );
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            tracing::info!("We will process this plot next: {}", file_name);
            return Ok(Some(PlotCandidate {
                path: entry.path().to_path_buf(),
                file_name,
                size: metadata.len(),
            }));
        }

        tracing::debug!("{:?} holds no plots to process, will check again soon", self.dir);
        Ok(None)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e == self.extension)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = PlotSource::new(dir.path(), "plot", 100);
        assert!(source.discover().unwrap().is_none());
    }

    #[test]
    fn test_undersized_plot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "small.plot", 10);

        let source = PlotSource::new(dir.path(), "plot", 100);
        assert!(source.discover().unwrap().is_none());
    }

    #[test]
    fn test_eligible_plot_is_found_past_undersized_ones() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "aaa-partial.plot", 10);
        write_file(dir.path(), "finished.plot", 200);

        let source = PlotSource::new(dir.path(), "plot", 100);
        let candidate = source.discover().unwrap().unwrap();
        assert_eq!(candidate.file_name, "finished.plot");
        assert_eq!(candidate.size, 200);
    }

    #[test]
    fn test_plot_of_exactly_minimum_size_is_eligible() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "boundary.plot", 100);

        let source = PlotSource::new(dir.path(), "plot", 100);
        let candidate = source.discover().unwrap().unwrap();
        assert_eq!(candidate.file_name, "boundary.plot");
        assert_eq!(candidate.size, 100);
    }

    #[test]
    fn test_plot_one_byte_below_minimum_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "almost.plot", 99);

        let source = PlotSource::new(dir.path(), "plot", 100);
        assert!(source.discover().unwrap().is_none());
    }

    #[test]
    fn test_other_extensions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "notes.txt", 500);
        write_file(dir.path(), "archive.tmp", 500);

        let source = PlotSource::new(dir.path(), "plot", 100);
        assert!(source.discover().unwrap().is_none());
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "finished.plot", 200);

        let source = PlotSource::new(dir.path(), "plot", 100);
        let first = source.discover().unwrap().unwrap();
        let second = source.discover().unwrap().unwrap();
        assert_eq!(first.file_name, second.file_name);
        assert_eq!(first.size, second.size);
    }
}
