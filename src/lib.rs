//! # DICOM-series library
//!
//! This crate serves a high-level API for indexing directory trees of DICOM
//! files into series and rendering single slices as windowed rasters.
//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components for file parsing and pixel decoding. A scan walks every
//! directory under a root, reads each ".dcm" file metadata-only, and groups
//! slices into series by (series number, rows, columns). Slices with the same
//! key are merged into one series even across sub-directories. A scan result
//! can be persisted per directory as a small JSON cache file, so re-opening a
//! folder on slow storage skips the file headers entirely; an unreadable or
//! outdated cache silently falls back to a raw scan of that directory.
//!
//! Rendering decodes one slice, converts stored values into calibrated
//! physical units (rescale slope/intercept, with the CT out-of-scan sentinel
//! zeroed first), optionally compresses a chosen value range into visible
//! contrast ("windowing"), and packs the result into a flat greyscale, RGB,
//! or RGBA byte buffer.
//!
//! # Examples
//!
//! ## Listing series and rendering a windowed slice
//!
//! Scan a folder of DICOM files, print a summary per series, then render the
//! middle slice of the first series with a soft-tissue window.
//!
//! ```no_run
//! # use dicom_series::{render, scan_directory_tree, WindowSpec};
//! # use std::path::PathBuf;
//! let mut index = scan_directory_tree(&PathBuf::from("dicom"), true)
//!     .expect("should have scanned the directory tree");
//! for record in index.records() {
//!     println!("{}", record.summary());
//! }
//! if let Some(record) = index.records_mut().first_mut() {
//!     let paths: Vec<_> = record.sorted_paths().map(|p| p.to_path_buf()).collect();
//!     let slice = &paths[paths.len() / 2];
//!     let raster = render(slice, Some(WindowSpec::new(40.0, 400.0)))
//!         .expect("should have rendered the slice");
//!     raster
//!         .to_image()
//!         .expect("windowed raster is 8-bit")
//!         .save("slice.png")
//!         .expect("should have saved the image");
//! }
//! ```

pub mod cache;
pub mod decode;
pub mod index;
pub mod raster;
pub mod render;
pub mod scan;

pub use cache::{CACHE_FILE_NAME, CacheError, write_cache};
pub use decode::{DecodeError, PixelBuffer, SliceMeta};
pub use index::{SeriesIndex, SeriesKey, SeriesRecord};
pub use raster::{Raster, RasterLayout};
pub use render::{RenderError, WindowSpec, render};
pub use scan::{
    ScanError, is_dicom_file, preload_directory_tree, scan_directory_tree,
    scan_directory_tree_with_cancel,
};

#[cfg(test)]
pub(crate) mod testutil;
