//! Filtered browsing: criteria are compiled into a predicate tree, rendered
//! to parameterised SQL and executed by one result assembler, whether the
//! caller is the plain image listing, a tag search or an album.

pub mod assemble;
pub mod criteria;
pub mod predicate;
pub mod sql;

pub use assemble::ImagePage;
pub use criteria::{parse_seed, Criteria, ExplicitnessLevel, NameFilter, PageWindow, Sort, SortKey};
pub use predicate::{compile, Predicate};

use crate::db::{AlbumKind, Database};
use crate::error::{GalleryError, Result};

impl Database {
    /// Browse the whole collection under `criteria`.
    pub fn browse(&self, criteria: &Criteria, sort: &Sort, window: Option<PageWindow>) -> Result<ImagePage> {
        self.assemble(&compile(criteria), sort, window)
    }

    /// Images carrying every one of `names`, in any category.
    pub fn images_by_tags(&self, names: &[String], sort: &Sort, window: Option<PageWindow>) -> Result<ImagePage> {
        let required: Vec<String> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if required.is_empty() {
            return Err(GalleryError::invalid("at least one tag is required"));
        }

        let criteria = Criteria {
            required_tags: required,
            ..Default::default()
        };
        self.browse(&criteria, sort, window)
    }

    /// Images of an album, narrowed further by `request`.
    ///
    /// A manual album contributes its explicit members. A smart album
    /// contributes its stored criteria, re-read on every call. Album
    /// membership inside smart criteria looks at explicit members only;
    /// smart albums are never expanded recursively.
    pub fn album_images(
        &self,
        album_id: i64,
        request: &Criteria,
        sort: &Sort,
        window: Option<PageWindow>,
    ) -> Result<ImagePage> {
        let album = self.get_album(album_id)?;
        let stored = match album.kind {
            AlbumKind::Manual => Criteria::album_members(album_id),
            AlbumKind::Smart => Criteria::from(self.smart_album_criteria(album_id)?),
        };

        let predicate = Predicate::and(vec![compile(&stored), compile(request)]);
        tracing::debug!(album_id, kind = album.kind.as_str(), "Browsing album");
        self.assemble(&predicate, sort, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SmartAlbumFilter, TagCategory};
    use std::collections::HashMap;

    fn categories() -> HashMap<String, TagCategory> {
        [
            ("cat", TagCategory::General),
            ("dog", TagCategory::General),
            ("hat", TagCategory::General),
            ("rin", TagCategory::Character),
            ("rating_general", TagCategory::Rating),
            ("rating_explicit", TagCategory::Rating),
        ]
        .into_iter()
        .map(|(name, cat)| (name.to_string(), cat))
        .collect()
    }

    fn add(db: &Database, phash: &str, tags: &[&str]) -> i64 {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        db.insert_image_with_tags(phash, &format!("{phash}.png"), 1, 1, &tags, &categories())
            .unwrap()
    }

    fn ids(page: &ImagePage) -> Vec<i64> {
        page.images.iter().map(|i| i.id).collect()
    }

    fn date_asc() -> Sort {
        Sort::new(SortKey::DateAsc)
    }

    #[test]
    fn test_browse_by_names() {
        let db = Database::open_in_memory().unwrap();
        let a = add(&db, "a", &["cat", "rin", "rating_general"]);
        let b = add(&db, "b", &["cat", "dog", "rating_explicit"]);
        let _c = add(&db, "c", &["dog"]);

        let mut criteria = Criteria::default();
        criteria.names_mut(TagCategory::General).include.push("cat".into());
        assert_eq!(ids(&db.browse(&criteria, &date_asc(), None).unwrap()), vec![a, b]);

        criteria.explicitness.exclude.push("explicit".into());
        assert_eq!(ids(&db.browse(&criteria, &date_asc(), None).unwrap()), vec![a]);

        // a name in the wrong category does not match
        let mut wrong = Criteria::default();
        wrong.names_mut(TagCategory::Character).include.push("cat".into());
        assert_eq!(db.browse(&wrong, &date_asc(), None).unwrap().total, 0);
    }

    #[test]
    fn test_unknown_include_name_matches_nothing() {
        let db = Database::open_in_memory().unwrap();
        add(&db, "a", &["cat"]);

        let mut criteria = Criteria::default();
        criteria.names_mut(TagCategory::General).include.push("unicorn".into());
        assert_eq!(db.browse(&criteria, &date_asc(), None).unwrap().total, 0);

        let mut excluded = Criteria::default();
        excluded.names_mut(TagCategory::General).exclude.push("unicorn".into());
        assert_eq!(db.browse(&excluded, &date_asc(), None).unwrap().total, 1);
    }

    #[test]
    fn test_images_by_tags_requires_all() {
        let db = Database::open_in_memory().unwrap();
        let a = add(&db, "a", &["cat", "hat"]);
        add(&db, "b", &["cat"]);

        let page = db
            .images_by_tags(&["cat".into(), " hat ".into()], &date_asc(), None)
            .unwrap();
        assert_eq!(ids(&page), vec![a]);

        assert!(matches!(
            db.images_by_tags(&[" ".into()], &date_asc(), None),
            Err(GalleryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_manual_album_images_with_request_filters() {
        let db = Database::open_in_memory().unwrap();
        let a = add(&db, "a", &["cat"]);
        let b = add(&db, "b", &["dog"]);
        add(&db, "c", &["cat"]);
        let album = db.create_album("Pets", AlbumKind::Manual, None).unwrap();
        db.add_images_to_album(album, &[a, b]).unwrap();

        let all = db.album_images(album, &Criteria::default(), &date_asc(), None).unwrap();
        assert_eq!(ids(&all), vec![a, b]);

        let mut request = Criteria::default();
        request.names_mut(TagCategory::General).exclude.push("dog".into());
        let filtered = db.album_images(album, &request, &date_asc(), None).unwrap();
        assert_eq!(ids(&filtered), vec![a]);
    }

    #[test]
    fn test_smart_album_merges_stored_and_request_criteria() {
        let db = Database::open_in_memory().unwrap();
        let a = add(&db, "a", &["cat", "rin"]);
        let b = add(&db, "b", &["cat"]);
        add(&db, "c", &["dog"]);
        let cat = db.tag_by_name("cat").unwrap().unwrap().tag.id;

        let smart = db.create_album("Cats", AlbumKind::Smart, None).unwrap();
        let filter = SmartAlbumFilter {
            include_tag_ids: vec![cat],
            ..Default::default()
        };
        db.update_smart_album_filter(smart, &filter, None).unwrap();

        let page = db.album_images(smart, &Criteria::default(), &date_asc(), None).unwrap();
        assert_eq!(ids(&page), vec![a, b]);

        let mut request = Criteria::default();
        request.names_mut(TagCategory::Character).include.push("rin".into());
        let page = db.album_images(smart, &request, &date_asc(), None).unwrap();
        assert_eq!(ids(&page), vec![a]);
    }

    #[test]
    fn test_empty_smart_album_and_missing_album() {
        let db = Database::open_in_memory().unwrap();
        add(&db, "a", &["cat"]);
        let smart = db.create_album("Everything", AlbumKind::Smart, None).unwrap();

        // no stored criteria: every image qualifies
        let page = db.album_images(smart, &Criteria::default(), &date_asc(), None).unwrap();
        assert_eq!(page.total, 1);

        assert!(matches!(
            db.album_images(999, &Criteria::default(), &date_asc(), None),
            Err(GalleryError::NotFound { entity: "album", id: 999 })
        ));
    }
}
