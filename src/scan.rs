use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{self, CACHE_FILE_NAME};
use crate::decode;
use crate::index::{SeriesAccumulator, SeriesIndex, SeriesKey};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not read directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("scan was cancelled")]
    Cancelled,
}

/// Check whether a file name looks like a DICOM file.
///
/// Not robust: this only checks for a `.dcm` suffix and performs no header
/// sniffing, so it must not be relied on for security-sensitive filtering.
pub fn is_dicom_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

/// Scan a directory tree for DICOM series.
///
/// Every directory under `root` is visited. With `use_cache` set, a directory
/// with a readable cache file contributes its cached records directly and its
/// files are not inspected; otherwise each `.dcm` file is read metadata-only
/// (pixel data is skipped for speed) and grouped by series key. Records with
/// the same key found in different sub-directories are merged into one.
///
/// A file that cannot be read and a sub-directory that cannot be listed are
/// skipped with a warning; only an unreadable `root` is an error. Nothing is
/// written to disk.
pub fn scan_directory_tree(
    root: impl AsRef<Path>,
    use_cache: bool,
) -> Result<SeriesIndex, ScanError> {
    scan_directory_tree_with_cancel(root, use_cache, &AtomicBool::new(false))
}

/// Like [`scan_directory_tree`], checking `cancel` between directories so a
/// long walk over slow storage can be abandoned from another thread.
pub fn scan_directory_tree_with_cancel(
    root: impl AsRef<Path>,
    use_cache: bool,
    cancel: &AtomicBool,
) -> Result<SeriesIndex, ScanError> {
    let root = root.as_ref();
    let mut acc = SeriesAccumulator::default();
    let mut pending = vec![root.to_path_buf()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        if cancel.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled);
        }

        let files = match list_directory(&dir, &mut pending) {
            Ok(files) => files,
            Err(source) if is_root => return Err(ScanError::Io { path: dir, source }),
            Err(source) => {
                warn!(directory = %dir.display(), error = %source, "skipping unreadable directory");
                continue;
            }
        };
        is_root = false;

        if use_cache {
            if let Some(records) = cache::read_cache(&dir) {
                debug!(directory = %dir.display(), "using cached series index");
                for record in records {
                    acc.absorb(record);
                }
                continue;
            }
        }

        fold_directory_files(&mut acc, files);
    }

    Ok(acc.finish())
}

/// Pre-compute and persist the series cache for every directory under `root`
/// that directly contains DICOM files, so later scans of slow storage take
/// milliseconds instead of minutes. Directories that already have a cache are
/// left alone unless `overwrite` is set. Returns the number of caches
/// written.
pub fn preload_directory_tree(root: impl AsRef<Path>, overwrite: bool) -> Result<usize, ScanError> {
    let root = root.as_ref();
    let mut pending = vec![root.to_path_buf()];
    let mut is_root = true;
    let mut written = 0;

    while let Some(dir) = pending.pop() {
        let files = match list_directory(&dir, &mut pending) {
            Ok(files) => files,
            Err(source) if is_root => return Err(ScanError::Io { path: dir, source }),
            Err(source) => {
                warn!(directory = %dir.display(), error = %source, "skipping unreadable directory");
                continue;
            }
        };
        is_root = false;

        if files.is_empty() || (!overwrite && dir.join(CACHE_FILE_NAME).exists()) {
            continue;
        }

        let mut acc = SeriesAccumulator::default();
        fold_directory_files(&mut acc, files);
        match cache::write_cache(&dir, &acc.finish()) {
            Ok(()) => written += 1,
            Err(err) => {
                warn!(directory = %dir.display(), error = %err, "could not write series cache");
            }
        }
    }

    Ok(written)
}

/// List one directory, pushing sub-directories onto the walk stack and
/// returning its DICOM files. Both are name-sorted so the fold order (and
/// therefore which of two duplicate instances survives) is deterministic
/// tree-wide, independent of filesystem iteration order.
fn list_directory(dir: &Path, pending: &mut Vec<PathBuf>) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)?.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_dicom_file)
        {
            files.push(path);
        }
    }
    // The stack pops in reverse push order, so sub-directories are visited
    // ascending by name.
    dirs.sort();
    pending.extend(dirs.into_iter().rev());
    files.sort();
    Ok(files)
}

fn fold_directory_files(acc: &mut SeriesAccumulator, files: Vec<PathBuf>) {
    for path in files {
        match decode::read_meta(&path) {
            Ok(meta) => {
                let key = SeriesKey {
                    series_number: meta.series_number,
                    rows: meta.rows,
                    columns: meta.columns,
                };
                let path = std::path::absolute(&path).unwrap_or(path);
                acc.add_slice(key, meta.description, meta.instance_number, path);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable DICOM file");
            }
        }
    }
}
