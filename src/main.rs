use std::env;
use std::path::{Path, PathBuf};

use dicom_series::{WindowSpec, preload_directory_tree, render, scan_directory_tree};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let root = args
        .next()
        .map(PathBuf::from)
        .expect("usage: dicom-series <directory> [--preload]");

    if args.any(|arg| arg == "--preload") {
        let written = preload_directory_tree(&root, false)
            .expect("should have preloaded directory tree");
        println!("wrote {written} cache file(s)");
        return;
    }

    let mut index =
        scan_directory_tree(&root, true).expect("should have scanned directory tree");
    for record in index.records() {
        println!("{}", record.summary());
    }

    if let Some(record) = index.records_mut().first_mut() {
        let paths: Vec<_> = record.sorted_paths().map(Path::to_path_buf).collect();
        if let Some(slice) = paths.get(paths.len() / 2) {
            let raster = render(slice, Some(WindowSpec::new(40.0, 400.0)))
                .expect("should have rendered slice at center of series");
            raster
                .to_image()
                .expect("windowed raster is 8-bit")
                .save("slice.png")
                .expect("should have saved rendered slice");
            println!("rendered {} -> slice.png", slice.display());
        }
    }
}
