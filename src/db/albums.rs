//! Albums: manual albums with explicit membership and smart albums whose
//! membership is recomputed from stored criteria on every read.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{ids_from_json, ids_to_json, Database};
use crate::error::{GalleryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumKind {
    Manual,
    Smart,
}

impl AlbumKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumKind::Manual => "manual",
            AlbumKind::Smart => "smart",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(AlbumKind::Manual),
            "smart" => Some(AlbumKind::Smart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AlbumKind,
    pub cover_image_id: Option<i64>,
    /// Explicit members; always zero for smart albums.
    pub image_count: i64,
}

/// The stored criteria of a smart album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartAlbumFilter {
    #[serde(default)]
    pub include_tag_ids: Vec<i64>,
    #[serde(default)]
    pub exclude_tag_ids: Vec<i64>,
    #[serde(default)]
    pub include_album_ids: Vec<i64>,
    #[serde(default)]
    pub exclude_album_ids: Vec<i64>,
    #[serde(default)]
    pub min_rating: u8,
    #[serde(default)]
    pub favorite_only: bool,
}

fn row_to_album(row: &rusqlite::Row) -> rusqlite::Result<Album> {
    let kind: String = row.get(2)?;
    let kind = AlbumKind::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown album kind {kind:?}").into(),
        )
    })?;
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        cover_image_id: row.get(3)?,
        image_count: row.get(4)?,
    })
}

const ALBUM_SELECT: &str = r#"
    SELECT a.id, a.name, a.kind, a.cover_image_id,
           (SELECT COUNT(*) FROM album_images WHERE album_id = a.id) AS image_count
    FROM albums a
"#;

impl Database {
    pub fn create_album(&self, name: &str, kind: AlbumKind, cover_image_id: Option<i64>) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GalleryError::invalid("album name is empty"));
        }
        if let Some(cover) = cover_image_id {
            self.ensure_image(cover)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO albums (name, kind, cover_image_id) VALUES (?, ?, ?)",
            params![name, kind.as_str(), cover_image_id],
        )?;
        let id = tx.last_insert_rowid();
        if kind == AlbumKind::Smart {
            tx.execute("INSERT INTO smart_album_filters (album_id) VALUES (?)", [id])?;
        }
        tx.commit()?;

        tracing::info!(album_id = id, kind = kind.as_str(), "Created album");
        Ok(id)
    }

    pub fn list_albums(&self) -> Result<Vec<Album>> {
        let mut stmt = self.conn.prepare(&format!("{ALBUM_SELECT} ORDER BY a.name, a.id"))?;
        let albums = stmt
            .query_map([], row_to_album)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    pub fn get_album(&self, album_id: i64) -> Result<Album> {
        self.conn
            .query_row(&format!("{ALBUM_SELECT} WHERE a.id = ?"), [album_id], row_to_album)
            .optional()?
            .ok_or_else(|| GalleryError::not_found("album", album_id))
    }

    pub fn delete_album(&self, album_id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM albums WHERE id = ?", [album_id])?;
        if changed == 0 {
            return Err(GalleryError::not_found("album", album_id));
        }
        Ok(())
    }

    pub fn set_album_cover(&self, album_id: i64, cover_image_id: Option<i64>) -> Result<()> {
        if let Some(cover) = cover_image_id {
            self.ensure_image(cover)?;
        }
        let changed = self.conn.execute(
            "UPDATE albums SET cover_image_id = ? WHERE id = ?",
            params![cover_image_id, album_id],
        )?;
        if changed == 0 {
            return Err(GalleryError::not_found("album", album_id));
        }
        Ok(())
    }

    fn ensure_manual_album(&self, album_id: i64) -> Result<()> {
        match self.get_album(album_id)?.kind {
            AlbumKind::Manual => Ok(()),
            AlbumKind::Smart => Err(GalleryError::invalid(format!(
                "album {album_id} is a smart album; its images come from its filters"
            ))),
        }
    }

    pub fn add_image_to_album(&self, album_id: i64, image_id: i64) -> Result<()> {
        self.ensure_manual_album(album_id)?;
        self.ensure_image(image_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO album_images (album_id, image_id) VALUES (?, ?)",
            params![album_id, image_id],
        )?;
        Ok(())
    }

    /// Add several images at once. Returns how many were newly added.
    pub fn add_images_to_album(&self, album_id: i64, image_ids: &[i64]) -> Result<usize> {
        self.ensure_manual_album(album_id)?;
        for &image_id in image_ids {
            self.ensure_image(image_id)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO album_images (album_id, image_id) VALUES (?, ?)")?;
            for &image_id in image_ids {
                added += stmt.execute(params![album_id, image_id])?;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    pub fn remove_image_from_album(&self, album_id: i64, image_id: i64) -> Result<()> {
        self.get_album(album_id)?;
        self.conn.execute(
            "DELETE FROM album_images WHERE album_id = ? AND image_id = ?",
            params![album_id, image_id],
        )?;
        Ok(())
    }

    // ========================================================================
    // Smart album store
    // ========================================================================

    pub fn smart_album_criteria(&self, album_id: i64) -> Result<SmartAlbumFilter> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT f.include_tag_ids, f.exclude_tag_ids, f.include_album_ids,
                       f.exclude_album_ids, f.min_rating, f.favorite_only
                FROM smart_album_filters f
                JOIN albums a ON a.id = f.album_id
                WHERE f.album_id = ? AND a.kind = 'smart'
                "#,
                [album_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, u8>(4)?,
                        row.get::<_, i64>(5)? != 0,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| GalleryError::not_found("smart album", album_id))?;

        Ok(SmartAlbumFilter {
            include_tag_ids: ids_from_json(&row.0)?,
            exclude_tag_ids: ids_from_json(&row.1)?,
            include_album_ids: ids_from_json(&row.2)?,
            exclude_album_ids: ids_from_json(&row.3)?,
            min_rating: row.4,
            favorite_only: row.5,
        })
    }

    /// Replace a smart album's criteria wholesale, and optionally its cover.
    pub fn update_smart_album_filter(
        &self,
        album_id: i64,
        filter: &SmartAlbumFilter,
        cover_image_id: Option<i64>,
    ) -> Result<()> {
        // NotFound for a missing or manual album before validating the body
        self.smart_album_criteria(album_id)?;
        self.validate_filter(album_id, filter)?;
        if let Some(cover) = cover_image_id {
            self.ensure_image(cover)?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            UPDATE smart_album_filters
            SET include_tag_ids = ?, exclude_tag_ids = ?, include_album_ids = ?,
                exclude_album_ids = ?, min_rating = ?, favorite_only = ?
            WHERE album_id = ?
            "#,
            params![
                ids_to_json(&filter.include_tag_ids)?,
                ids_to_json(&filter.exclude_tag_ids)?,
                ids_to_json(&filter.include_album_ids)?,
                ids_to_json(&filter.exclude_album_ids)?,
                filter.min_rating,
                filter.favorite_only as i64,
                album_id,
            ],
        )?;
        if cover_image_id.is_some() {
            tx.execute(
                "UPDATE albums SET cover_image_id = ? WHERE id = ?",
                params![cover_image_id, album_id],
            )?;
        }
        tx.commit()?;

        tracing::debug!(album_id, ?filter, "Updated smart album filter");
        Ok(())
    }

    fn validate_filter(&self, album_id: i64, filter: &SmartAlbumFilter) -> Result<()> {
        if filter.min_rating > 5 {
            return Err(GalleryError::invalid(format!(
                "min_rating must be between 0 and 5, got {}",
                filter.min_rating
            )));
        }

        let tag_ids = filter.include_tag_ids.iter().chain(&filter.exclude_tag_ids);
        let missing_tags = self.missing_ids("tags", tag_ids)?;
        if !missing_tags.is_empty() {
            return Err(GalleryError::invalid(format!("unknown tag ids {missing_tags:?}")));
        }

        let album_ids: Vec<i64> = filter
            .include_album_ids
            .iter()
            .chain(&filter.exclude_album_ids)
            .copied()
            .collect();
        if album_ids.contains(&album_id) {
            return Err(GalleryError::invalid("a smart album cannot reference itself"));
        }
        let missing_albums = self.missing_ids("albums", album_ids.iter())?;
        if !missing_albums.is_empty() {
            return Err(GalleryError::invalid(format!("unknown album ids {missing_albums:?}")));
        }

        Ok(())
    }

    fn missing_ids<'a>(&self, table: &str, ids: impl Iterator<Item = &'a i64>) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"))?;
        let mut missing = Vec::new();
        for &id in ids {
            let exists: bool = stmt.query_row([id], |row| row.get(0))?;
            if !exists && !missing.contains(&id) {
                missing.push(id);
            }
        }
        Ok(missing)
    }
}
