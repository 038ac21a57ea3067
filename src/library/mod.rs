//! File-system side of the gallery: moving raw images into the gallery
//! under their perceptual hash, importing tag files, and exporting
//! selections to plain directories.

mod export;
mod import;
mod organize;

pub use export::{export, export_dir_name, ExportReport, ExportRequest};
pub use import::{import, load_category_map, load_tags, ImportReport};
pub use organize::{organize, perceptual_hash, OrganizeReport};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Does `path` carry one of `extensions`, compared case-insensitively.
pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| e.to_lowercase() == ext))
}

/// All files under `directory` with one of `extensions`, sorted by path.
pub fn discover_images(directory: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, extensions))
        .collect();

    images.sort();
    images
}
