use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::index::{SeriesIndex, SeriesRecord};

/// File name of the per-directory series cache.
pub const CACHE_FILE_NAME: &str = "dicom_metadata.json";

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("could not write cache file: {0}")]
    Io(#[from] io::Error),

    #[error("could not serialize series index: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    series: Vec<SeriesRecord>,
}

/// Persist `index` as the cache for `directory`.
///
/// The payload is written to a temporary file in the same directory and
/// renamed over the final name, so readers never observe a half-written
/// cache and an existing cache is replaced atomically.
pub fn write_cache(directory: &Path, index: &SeriesIndex) -> Result<(), CacheError> {
    let payload = serde_json::to_vec(&CacheFile {
        version: CACHE_VERSION,
        series: index.records().to_vec(),
    })?;

    let tmp_path = directory.join(format!("{CACHE_FILE_NAME}.tmp"));
    fs::write(&tmp_path, payload)?;
    fs::rename(&tmp_path, directory.join(CACHE_FILE_NAME))?;
    Ok(())
}

/// Read the series cache of `directory`, if it has a usable one.
///
/// Every failure mode, from a missing file to a truncated payload to a
/// version mismatch, is a cache miss: the caller falls back to scanning the
/// directory's files. Nothing here is a hard error.
pub fn read_cache(directory: &Path) -> Option<Vec<SeriesRecord>> {
    let path = directory.join(CACHE_FILE_NAME);
    let bytes = fs::read(&path).ok()?;

    match serde_json::from_slice::<CacheFile>(&bytes) {
        Ok(cache) if cache.version == CACHE_VERSION => Some(cache.series),
        Ok(cache) => {
            debug!(
                path = %path.display(),
                found = cache.version,
                expected = CACHE_VERSION,
                "cache version mismatch, rescanning directory"
            );
            None
        }
        Err(err) => {
            debug!(
                path = %path.display(),
                error = %err,
                "unreadable cache file, rescanning directory"
            );
            None
        }
    }
}
