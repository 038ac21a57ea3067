use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{GalleryError, Result};

/// Which images to copy out, and where to.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub images: Vec<i64>,
    pub export_name: String,
    /// `album`, `series`, `character`, ...; anything but `album` becomes a
    /// directory prefix.
    #[serde(default = "default_export_type")]
    pub export_type: String,
    /// Reuse an existing export directory and only copy what is missing.
    #[serde(default)]
    pub update_only: bool,
}

fn default_export_type() -> String {
    "album".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub export_path: PathBuf,
    pub exported_count: usize,
    pub skipped_count: usize,
    pub total_requested: usize,
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory name for an export: the sanitised name, prefixed with
/// `<type>__` unless the type is `album`. Unless `reuse` is set, a `-N`
/// suffix is appended until the name is free.
pub fn export_dir_name(exports_dir: &Path, name: &str, export_type: &str, reuse: bool) -> String {
    let clean = sanitize(name);
    let base = if export_type == "album" {
        clean
    } else {
        format!("{}__{}", sanitize(export_type), clean)
    };

    if reuse || !exports_dir.join(&base).exists() {
        return base;
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !exports_dir.join(candidate).exists())
        .unwrap_or(base)
}

/// Copy the requested gallery files into a directory under `exports_dir`.
/// Images that are not in the store, or whose file cannot be copied, are
/// logged and left out.
pub fn export(db: &Database, gallery_dir: &Path, exports_dir: &Path, request: &ExportRequest) -> Result<ExportReport> {
    if request.images.is_empty() {
        return Err(GalleryError::invalid("no images specified for export"));
    }
    if request.export_name.trim().is_empty() {
        return Err(GalleryError::invalid("export name is empty"));
    }

    std::fs::create_dir_all(exports_dir)?;
    let dir_name = export_dir_name(exports_dir, &request.export_name, &request.export_type, request.update_only);
    let export_path = exports_dir.join(dir_name);
    std::fs::create_dir_all(&export_path)?;

    let existing: HashSet<String> = if request.update_only {
        std::fs::read_dir(&export_path)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect()
    } else {
        HashSet::new()
    };

    let mut exported_count = 0;
    let mut skipped_count = 0;

    for &image_id in &request.images {
        let image = match db.get_image(image_id) {
            Ok(detail) => detail.image,
            Err(GalleryError::NotFound { .. }) => {
                warn!("Export skipping unknown image {}", image_id);
                continue;
            }
            Err(e) => return Err(e),
        };

        if existing.contains(&image.filename) {
            skipped_count += 1;
            continue;
        }

        let source = gallery_dir.join(&image.filename);
        match std::fs::copy(&source, export_path.join(&image.filename)) {
            Ok(_) => exported_count += 1,
            Err(e) => warn!("Failed to copy {:?}: {}", source, e),
        }
    }

    info!(
        path = %export_path.display(),
        exported_count,
        skipped_count,
        "Export completed"
    );

    Ok(ExportReport {
        export_path,
        exported_count,
        skipped_count,
        total_requested: request.images.len(),
    })
}
