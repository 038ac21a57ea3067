//! Tags and their categories.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::Database;
use crate::error::{GalleryError, Result};

/// Category a tag belongs to. Anything the importer does not recognise is
/// stored as uncategorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    General,
    Character,
    Copyright,
    Artist,
    Rating,
    Uncategorized,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::General => "general",
            TagCategory::Character => "character",
            TagCategory::Copyright => "copyright",
            TagCategory::Artist => "artist",
            TagCategory::Rating => "rating",
            TagCategory::Uncategorized => "",
        }
    }

    /// Lenient parse used for stored rows and request bodies. `series` is
    /// accepted as the user-facing name of `copyright`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "general" => TagCategory::General,
            "character" => TagCategory::Character,
            "copyright" | "series" => TagCategory::Copyright,
            "artist" => TagCategory::Artist,
            "rating" => TagCategory::Rating,
            _ => TagCategory::Uncategorized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub category: TagCategory,
    #[serde(rename = "isFavorite")]
    pub favorite: bool,
}

/// A tag as listed on a category page.
#[derive(Debug, Clone, Serialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    #[serde(rename = "imageCount")]
    pub image_count: i64,
}

pub(crate) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    let category: Option<String> = row.get(2)?;
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        category: TagCategory::parse(category.as_deref().unwrap_or("")),
        favorite: row.get::<_, i64>(3)? != 0,
    })
}

impl Database {
    pub fn tags_by_category(&self, category: TagCategory) -> Result<Vec<TagWithCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, t.category, t.favorite, COUNT(it.image_id) AS image_count
            FROM tags t
            LEFT JOIN image_tags it ON it.tag_id = t.id
            WHERE COALESCE(t.category, '') = ?
            GROUP BY t.id
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([category.as_str()], |row| {
                Ok(TagWithCount {
                    tag: row_to_tag(row)?,
                    image_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn tag_by_name(&self, name: &str) -> Result<Option<TagWithCount>> {
        let tag = self
            .conn
            .query_row(
                r#"
                SELECT t.id, t.name, t.category, t.favorite,
                       (SELECT COUNT(*) FROM image_tags WHERE tag_id = t.id)
                FROM tags t
                WHERE t.name = ?
                "#,
                [name],
                |row| {
                    Ok(TagWithCount {
                        tag: row_to_tag(row)?,
                        image_count: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(tag)
    }

    pub fn set_tag_favorite(&self, tag_id: i64, favorite: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tags SET favorite = ? WHERE id = ?",
            params![favorite as i64, tag_id],
        )?;
        if changed == 0 {
            return Err(GalleryError::not_found("tag", tag_id));
        }
        Ok(())
    }

    /// Insert the tag if it is new, otherwise overwrite its category.
    /// Returns the tag id.
    pub(crate) fn upsert_tag(&self, name: &str, category: TagCategory) -> Result<i64> {
        let id = self.conn.query_row(
            r#"
            INSERT INTO tags (name, category) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET category = excluded.category
            RETURNING id
            "#,
            params![name, category.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub(crate) fn get_tag(&self, tag_id: i64) -> Result<Tag> {
        self.conn
            .query_row(
                "SELECT id, name, category, favorite FROM tags WHERE id = ?",
                [tag_id],
                row_to_tag,
            )
            .optional()?
            .ok_or_else(|| GalleryError::not_found("tag", tag_id))
    }

    pub(crate) fn tag_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?", [name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(TagCategory::parse("character"), TagCategory::Character);
        assert_eq!(TagCategory::parse("Series"), TagCategory::Copyright);
        assert_eq!(TagCategory::parse("copyright"), TagCategory::Copyright);
        assert_eq!(TagCategory::parse("meta"), TagCategory::Uncategorized);
        assert_eq!(TagCategory::parse(""), TagCategory::Uncategorized);
    }

    #[test]
    fn test_upsert_overwrites_category() {
        let db = Database::open_in_memory().unwrap();
        let first = db.upsert_tag("saber", TagCategory::General).unwrap();
        let second = db.upsert_tag("saber", TagCategory::Character).unwrap();
        assert_eq!(first, second);

        let tag = db.tag_by_name("saber").unwrap().unwrap();
        assert_eq!(tag.tag.category, TagCategory::Character);
        assert_eq!(tag.image_count, 0);
    }

    #[test]
    fn test_tags_by_category_counts_images() {
        let db = Database::open_in_memory().unwrap();
        let mut map = std::collections::HashMap::new();
        map.insert("cat".to_string(), TagCategory::General);
        map.insert("dog".to_string(), TagCategory::General);
        map.insert("rin".to_string(), TagCategory::Character);

        db.insert_image_with_tags("a", "a.png", 1, 1, &["cat".into(), "rin".into()], &map)
            .unwrap();
        db.insert_image_with_tags("b", "b.png", 1, 1, &["cat".into(), "dog".into()], &map)
            .unwrap();

        let general = db.tags_by_category(TagCategory::General).unwrap();
        let names: Vec<_> = general.iter().map(|t| (t.tag.name.as_str(), t.image_count)).collect();
        assert_eq!(names, vec![("cat", 2), ("dog", 1)]);

        let characters = db.tags_by_category(TagCategory::Character).unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].tag.name, "rin");
    }

    #[test]
    fn test_set_tag_favorite() {
        let db = Database::open_in_memory().unwrap();
        let id = db.upsert_tag("cat", TagCategory::General).unwrap();

        db.set_tag_favorite(id, true).unwrap();
        assert!(db.tag_by_name("cat").unwrap().unwrap().tag.favorite);

        db.set_tag_favorite(id, false).unwrap();
        assert!(!db.tag_by_name("cat").unwrap().unwrap().tag.favorite);

        assert!(matches!(
            db.set_tag_favorite(999, true),
            Err(GalleryError::NotFound { entity: "tag", id: 999 })
        ));
    }
}
