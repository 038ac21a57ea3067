//! Image rows, their tag associations and user-editable fields.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

use super::tags::{row_to_tag, Tag, TagCategory};
use super::Database;
use crate::error::{GalleryError, Result};

/// Column list matching [`row_to_summary`].
pub(crate) const IMAGE_COLUMNS: &str = "images.id, images.phash, images.filename, images.width, \
     images.height, images.favorite, images.like_count, images.rating";

/// What listings return for each image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub id: i64,
    pub phash: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub favorite: bool,
    pub likes: u32,
    pub rating: u8,
}

/// A single image with its tags.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDetail {
    #[serde(flatten)]
    pub image: ImageSummary,
    pub tags: Vec<Tag>,
}

pub(crate) fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<ImageSummary> {
    Ok(ImageSummary {
        id: row.get(0)?,
        phash: row.get(1)?,
        filename: row.get(2)?,
        width: row.get(3)?,
        height: row.get(4)?,
        favorite: row.get::<_, i64>(5)? != 0,
        likes: row.get(6)?,
        rating: row.get(7)?,
    })
}

/// A single user-editable field, validated before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUpdate {
    Rating(u8),
    Favorite(bool),
    LikeCount(u32),
}

impl ImageUpdate {
    pub fn rating(value: i64) -> Result<Self> {
        match u8::try_from(value) {
            Ok(r) if r <= 5 => Ok(ImageUpdate::Rating(r)),
            _ => Err(GalleryError::invalid(format!("rating must be between 0 and 5, got {value}"))),
        }
    }

    pub fn like_count(value: i64) -> Result<Self> {
        u32::try_from(value)
            .map(ImageUpdate::LikeCount)
            .map_err(|_| GalleryError::invalid(format!("like count must be non-negative, got {value}")))
    }

    /// Name of the field as it appears in request and response bodies.
    pub fn field(&self) -> &'static str {
        match self {
            ImageUpdate::Rating(_) => "rating",
            ImageUpdate::Favorite(_) => "favorite",
            ImageUpdate::LikeCount(_) => "likes",
        }
    }

    pub fn value(&self) -> serde_json::Value {
        match *self {
            ImageUpdate::Rating(r) => r.into(),
            ImageUpdate::Favorite(f) => f.into(),
            ImageUpdate::LikeCount(n) => n.into(),
        }
    }
}

impl Database {
    /// Insert a newly imported image and link its tags, creating tags as
    /// needed. Tags missing from `categories` are stored uncategorized.
    pub fn insert_image_with_tags(
        &self,
        phash: &str,
        filename: &str,
        width: u32,
        height: u32,
        tags: &[String],
        categories: &HashMap<String, TagCategory>,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO images (phash, filename, width, height) VALUES (?, ?, ?, ?)",
            params![phash, filename, width, height],
        )?;
        let image_id = tx.last_insert_rowid();

        for raw in tags {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            let category = categories
                .get(name)
                .copied()
                .unwrap_or(TagCategory::Uncategorized);
            let tag_id = self.upsert_tag(name, category)?;
            tx.execute(
                "INSERT OR IGNORE INTO image_tags (image_id, tag_id) VALUES (?, ?)",
                params![image_id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(image_id)
    }

    pub fn image_exists(&self, phash: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM images WHERE phash = ?)",
            [phash],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub(crate) fn ensure_image(&self, image_id: i64) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM images WHERE id = ?)",
            [image_id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(GalleryError::not_found("image", image_id))
        }
    }

    pub fn get_image(&self, image_id: i64) -> Result<ImageDetail> {
        let image = self
            .conn
            .query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE images.id = ?"),
                [image_id],
                row_to_summary,
            )
            .optional()?
            .ok_or_else(|| GalleryError::not_found("image", image_id))?;

        let tags = self.get_image_tags(image_id)?;
        Ok(ImageDetail { image, tags })
    }

    pub fn get_image_tags(&self, image_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, t.category, t.favorite
            FROM tags t
            JOIN image_tags it ON it.tag_id = t.id
            WHERE it.image_id = ?
            ORDER BY t.category, t.name
            "#,
        )?;
        let tags = stmt
            .query_map([image_id], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn update_image(&self, image_id: i64, update: ImageUpdate) -> Result<()> {
        let changed = match update {
            ImageUpdate::Rating(r) => self.conn.execute(
                "UPDATE images SET rating = ? WHERE id = ?",
                params![r, image_id],
            )?,
            ImageUpdate::Favorite(f) => self.conn.execute(
                "UPDATE images SET favorite = ? WHERE id = ?",
                params![f as i64, image_id],
            )?,
            ImageUpdate::LikeCount(n) => self.conn.execute(
                "UPDATE images SET like_count = ? WHERE id = ?",
                params![n, image_id],
            )?,
        };
        if changed == 0 {
            return Err(GalleryError::not_found("image", image_id));
        }
        Ok(())
    }

    pub fn add_tag_to_image(&self, image_id: i64, name: &str, category: TagCategory) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GalleryError::invalid("tag name is empty"));
        }
        self.ensure_image(image_id)?;

        let tag_id = self.upsert_tag(name, category)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO image_tags (image_id, tag_id) VALUES (?, ?)",
            params![image_id, tag_id],
        )?;

        // re-read so an existing tag keeps its favorite flag
        self.get_tag(tag_id)
    }

    /// Unlink a tag by name. Unknown tags are a no-op.
    pub fn remove_tag_from_image(&self, image_id: i64, name: &str) -> Result<()> {
        let Some(tag_id) = self.tag_id_by_name(name.trim())? else {
            return Ok(());
        };
        self.conn.execute(
            "DELETE FROM image_tags WHERE image_id = ? AND tag_id = ?",
            params![image_id, tag_id],
        )?;
        Ok(())
    }
}
