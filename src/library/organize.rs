use img_hash::{HashAlg, HasherConfig};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::discover_images;
use crate::error::{GalleryError, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizeReport {
    pub moved: usize,
    /// A file with the same hash was already in the gallery.
    pub skipped: usize,
    /// Could not be decoded or moved.
    pub failed: usize,
}

/// 64-bit DCT perceptual hash of an image file, as 16 lowercase hex digits.
pub fn perceptual_hash(path: &Path) -> Result<String> {
    let img = image::open(path)
        .map_err(|e| GalleryError::invalid(format!("cannot decode {}: {e}", path.display())))?;

    // img_hash links its own copy of `image`; hand it raw RGBA
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let hash_input = img_hash::image::RgbaImage::from_raw(width, height, rgba.into_raw())
        .ok_or_else(|| GalleryError::invalid(format!("cannot hash {}", path.display())))?;

    let hasher = HasherConfig::new()
        .hash_size(8, 8)
        .hash_alg(HashAlg::Mean)
        .preproc_dct()
        .to_hasher();
    let hash = hasher.hash_image(&img_hash::image::DynamicImage::ImageRgba8(hash_input));

    Ok(hash.as_bytes().iter().map(|b| format!("{b:02x}")).collect())
}

/// Move files that share a device with a rename, otherwise copy and delete.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

/// Move every image under `raw_dir` into `gallery_dir` as `<phash>.<ext>`.
///
/// Existing gallery files are never overwritten, so a second copy of an
/// image stays where it was.
pub fn organize(raw_dir: &Path, gallery_dir: &Path, extensions: &[String]) -> Result<OrganizeReport> {
    std::fs::create_dir_all(gallery_dir)?;
    let mut report = OrganizeReport::default();

    for path in discover_images(raw_dir, extensions) {
        let hash = match perceptual_hash(&path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                report.failed += 1;
                continue;
            }
        };

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let target = gallery_dir.join(format!("{hash}.{ext}"));

        if target.exists() {
            debug!("{:?} already in gallery as {:?}", path, target);
            report.skipped += 1;
            continue;
        }

        match move_file(&path, &target) {
            Ok(()) => report.moved += 1,
            Err(e) => {
                warn!("Failed to move {:?} to {:?}: {}", path, target, e);
                report.failed += 1;
            }
        }
    }

    info!(
        moved = report.moved,
        skipped = report.skipped,
        failed = report.failed,
        "Organized raw images"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_png(path: &Path, shade: u8) {
        let img = image::RgbImage::from_fn(32, 32, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                image::Rgb([shade, shade, shade])
            } else {
                image::Rgb([255 - shade, 0, 0])
            }
        });
        img.save(path).unwrap();
    }

    fn extensions() -> Vec<String> {
        vec!["png".to_string(), "jpg".to_string()]
    }

    #[test]
    fn test_perceptual_hash_is_stable_hex() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 10);

        let first = perceptual_hash(&path).unwrap();
        assert_eq!(first.len(), 16);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, perceptual_hash(&path).unwrap());
    }

    #[test]
    fn test_organize_moves_and_skips_duplicates() {
        let raw = tempdir().unwrap();
        let gallery = tempdir().unwrap();

        write_png(&raw.path().join("one.png"), 10);
        // identical pixels, so identical hash
        write_png(&raw.path().join("two.png"), 10);
        std::fs::write(raw.path().join("broken.png"), b"not an image").unwrap();
        std::fs::write(raw.path().join("readme.txt"), b"ignored").unwrap();

        let report = organize(raw.path(), gallery.path(), &extensions()).unwrap();
        assert_eq!(
            report,
            OrganizeReport {
                moved: 1,
                skipped: 1,
                failed: 1
            }
        );

        let moved: Vec<_> = std::fs::read_dir(gallery.path()).unwrap().collect();
        assert_eq!(moved.len(), 1);
        assert!(!raw.path().join("one.png").exists());
        assert!(raw.path().join("two.png").exists());
    }
}
