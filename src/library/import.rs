use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::db::{Database, TagCategory};
use crate::error::Result;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    /// Already in the store.
    pub skipped: usize,
    /// Tag file without a matching gallery image.
    pub missing: usize,
    pub failed: usize,
}

/// Read a `{"tag": "category"}` JSON map.
pub fn load_category_map(path: &Path) -> Result<HashMap<String, TagCategory>> {
    let content = std::fs::read_to_string(path)?;
    let raw: HashMap<String, String> = serde_json::from_str(&content)?;
    Ok(raw
        .into_iter()
        .map(|(tag, category)| (tag, TagCategory::parse(&category)))
        .collect())
}

/// Parse a comma-separated tag file. A trailing `%` left by the tagger is
/// dropped, as are blank entries.
pub fn load_tags(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let content = content.trim();
    let content = content.strip_suffix('%').unwrap_or(content);
    Ok(content
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

fn find_gallery_file(gallery_dir: &Path, phash: &str, extensions: &[String]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| gallery_dir.join(format!("{phash}.{}", ext.to_lowercase())))
        .find(|p| p.is_file())
}

/// Insert every `<phash>.txt` under `tags_dir` that is not stored yet,
/// linking it to `gallery/<phash>.<ext>`.
pub fn import(
    db: &Database,
    tags_dir: &Path,
    category_map_path: &Path,
    gallery_dir: &Path,
    extensions: &[String],
) -> Result<ImportReport> {
    let categories = load_category_map(category_map_path)?;
    let mut report = ImportReport::default();

    let mut tag_files: Vec<PathBuf> = std::fs::read_dir(tags_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "txt"))
        .collect();
    tag_files.sort();

    for tag_file in tag_files {
        let Some(phash) = tag_file.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        if db.image_exists(&phash)? {
            debug!("Skipping {}: already imported", phash);
            report.skipped += 1;
            continue;
        }

        let Some(image_path) = find_gallery_file(gallery_dir, &phash, extensions) else {
            warn!("No gallery image for tag file {:?}", tag_file);
            report.missing += 1;
            continue;
        };

        let tags = match load_tags(&tag_file) {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Failed to read {:?}: {}", tag_file, e);
                report.failed += 1;
                continue;
            }
        };

        let (width, height) = image::image_dimensions(&image_path).unwrap_or_else(|e| {
            warn!("Cannot read dimensions of {:?}: {}", image_path, e);
            (0, 0)
        });

        let filename = image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match db.insert_image_with_tags(&phash, &filename, width, height, &tags, &categories) {
            Ok(_) => report.imported += 1,
            Err(e) => {
                warn!("Failed to insert {}: {}", phash, e);
                report.failed += 1;
            }
        }
    }

    info!(
        imported = report.imported,
        skipped = report.skipped,
        missing = report.missing,
        failed = report.failed,
        "Imported tag files"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_tags_strips_trailing_percent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, " cat, hat ,, rin%\n").unwrap();
        assert_eq!(load_tags(&path).unwrap(), vec!["cat", "hat", "rin"]);
    }

    #[test]
    fn test_load_category_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, r#"{"rin": "character", "fate": "copyright", "odd": "meta"}"#).unwrap();

        let map = load_category_map(&path).unwrap();
        assert_eq!(map["rin"], TagCategory::Character);
        assert_eq!(map["fate"], TagCategory::Copyright);
        assert_eq!(map["odd"], TagCategory::Uncategorized);
    }

    #[test]
    fn test_import_tag_files() {
        let tags = tempdir().unwrap();
        let gallery = tempdir().unwrap();
        let map = tags.path().join("map.json");
        std::fs::write(&map, r#"{"rin": "character"}"#).unwrap();

        image::RgbImage::new(6, 4)
            .save(gallery.path().join("aaaa.png"))
            .unwrap();
        std::fs::write(tags.path().join("aaaa.txt"), "rin, cat%").unwrap();
        std::fs::write(tags.path().join("bbbb.txt"), "dog").unwrap();

        let db = Database::open_in_memory().unwrap();
        let extensions = vec!["jpg".to_string(), "png".to_string()];

        let report = import(&db, tags.path(), &map, gallery.path(), &extensions).unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 1,
                skipped: 0,
                missing: 1,
                failed: 0
            }
        );

        let again = import(&db, tags.path(), &map, gallery.path(), &extensions).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 1);

        let id = db.tag_by_name("rin").unwrap().unwrap();
        assert_eq!(id.tag.category, TagCategory::Character);
        assert_eq!(id.image_count, 1);

        let image = db.get_image(1).unwrap();
        assert_eq!(image.image.filename, "aaaa.png");
        assert_eq!((image.image.width, image.image.height), (6, 4));
    }
}
