//! End-to-end filtering behaviour through the public library API.

use std::collections::HashMap;

use ago::db::{AlbumKind, Database, ImageUpdate, SmartAlbumFilter, TagCategory};
use ago::query::{Criteria, ImagePage, PageWindow, Sort, SortKey};

fn categories() -> HashMap<String, TagCategory> {
    [
        ("cat", TagCategory::General),
        ("dog", TagCategory::General),
        ("rating_general", TagCategory::Rating),
        ("rating_explicit", TagCategory::Rating),
    ]
    .into_iter()
    .map(|(name, category)| (name.to_string(), category))
    .collect()
}

fn add(db: &Database, phash: &str, tags: &[&str], rating: u8) -> i64 {
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    let id = db
        .insert_image_with_tags(phash, &format!("{phash}.png"), 10, 10, &tags, &categories())
        .unwrap();
    db.update_image(id, ImageUpdate::Rating(rating)).unwrap();
    id
}

fn ids(page: &ImagePage) -> Vec<i64> {
    page.images.iter().map(|i| i.id).collect()
}

fn tag_id(db: &Database, name: &str) -> i64 {
    db.tag_by_name(name).unwrap().unwrap().tag.id
}

fn date_asc() -> Sort {
    Sort::new(SortKey::DateAsc)
}

#[test]
fn cat_without_dog_rated_three_or_more() {
    let db = Database::open_in_memory().unwrap();
    let one = add(&db, "one", &["cat"], 4);
    add(&db, "two", &["cat", "dog"], 5);
    add(&db, "three", &["dog"], 5);

    let mut criteria = Criteria {
        min_rating: 3,
        ..Default::default()
    };
    criteria.names_mut(TagCategory::General).include.push("cat".into());
    criteria.names_mut(TagCategory::General).exclude.push("dog".into());

    let page = db.browse(&criteria, &date_asc(), None).unwrap();
    assert_eq!(ids(&page), vec![one]);
    assert_eq!(page.total, 1);

    // the same request by tag id
    let by_id = Criteria {
        include_tag_ids: [tag_id(&db, "cat")].into(),
        exclude_tag_ids: [tag_id(&db, "dog")].into(),
        min_rating: 3,
        ..Default::default()
    };
    assert_eq!(ids(&db.browse(&by_id, &date_asc(), None).unwrap()), vec![one]);
}

#[test]
fn empty_criteria_returns_everything() {
    let db = Database::open_in_memory().unwrap();
    for i in 0..5 {
        add(&db, &format!("h{i}"), &["cat"], 0);
    }

    let filtered = db.browse(&Criteria::default(), &date_asc(), None).unwrap();
    let unfiltered = db
        .assemble(&ago::query::Predicate::All, &date_asc(), None)
        .unwrap();
    assert_eq!(ids(&filtered), ids(&unfiltered));
    assert_eq!(filtered.total, 5);
}

#[test]
fn excluded_tag_beats_included_tag() {
    let db = Database::open_in_memory().unwrap();
    add(&db, "a", &["cat"], 0);
    let cat = tag_id(&db, "cat");

    let criteria = Criteria {
        include_tag_ids: [cat].into(),
        exclude_tag_ids: [cat].into(),
        ..Default::default()
    };
    assert_eq!(db.browse(&criteria, &date_asc(), None).unwrap().total, 0);
}

#[test]
fn included_album_beats_excluded_album() {
    let db = Database::open_in_memory().unwrap();
    let a = add(&db, "a", &[], 0);
    let b = add(&db, "b", &[], 0);
    let c = add(&db, "c", &[], 0);

    let one = db.create_album("one", AlbumKind::Manual, None).unwrap();
    let two = db.create_album("two", AlbumKind::Manual, None).unwrap();
    db.add_images_to_album(one, &[a]).unwrap();
    db.add_images_to_album(two, &[a, b]).unwrap();

    let criteria = Criteria {
        include_album_ids: [one].into(),
        exclude_album_ids: [two].into(),
        ..Default::default()
    };
    let page = db.browse(&criteria, &date_asc(), None).unwrap();
    // a is in both: kept. b only excluded: dropped. c in neither: dropped.
    assert_eq!(ids(&page), vec![a]);

    let exclude_only = Criteria {
        exclude_album_ids: [two].into(),
        ..Default::default()
    };
    assert_eq!(ids(&db.browse(&exclude_only, &date_asc(), None).unwrap()), vec![c]);
}

#[test]
fn smart_album_applies_album_precedence() {
    let db = Database::open_in_memory().unwrap();
    let a = add(&db, "a", &[], 0);
    let b = add(&db, "b", &[], 0);

    let keep = db.create_album("keep", AlbumKind::Manual, None).unwrap();
    let drop = db.create_album("drop", AlbumKind::Manual, None).unwrap();
    db.add_images_to_album(keep, &[a]).unwrap();
    db.add_images_to_album(drop, &[a, b]).unwrap();

    let smart = db.create_album("smart", AlbumKind::Smart, None).unwrap();
    let filter = SmartAlbumFilter {
        include_album_ids: vec![keep],
        exclude_album_ids: vec![drop],
        ..Default::default()
    };
    db.update_smart_album_filter(smart, &filter, None).unwrap();

    let page = db
        .album_images(smart, &Criteria::default(), &date_asc(), None)
        .unwrap();
    assert_eq!(ids(&page), vec![a]);
}

#[test]
fn rating_desc_ties_fall_back_to_id() {
    let db = Database::open_in_memory().unwrap();
    let ratings = [3, 3, 5, 1];
    let ids_in_order: Vec<i64> = ratings
        .iter()
        .enumerate()
        .map(|(i, r)| add(&db, &format!("r{i}"), &[], *r))
        .collect();

    let page = db
        .browse(&Criteria::default(), &Sort::new(SortKey::RatingDesc), None)
        .unwrap();
    let expected = vec![ids_in_order[2], ids_in_order[1], ids_in_order[0], ids_in_order[3]];
    assert_eq!(ids(&page), expected);
}

#[test]
fn pagination_is_a_window_over_one_order() {
    let db = Database::open_in_memory().unwrap();
    for i in 0..50 {
        add(&db, &format!("p{i}"), &["cat"], (i % 6) as u8);
    }
    let sort = Sort::new(SortKey::RatingDesc);
    let criteria = Criteria::default();

    let all = db.browse(&criteria, &sort, None).unwrap();
    let first = db
        .browse(&criteria, &sort, Some(PageWindow::clamped(Some(1), Some(20), 20, 100)))
        .unwrap();
    let second = db
        .browse(&criteria, &sort, Some(PageWindow::clamped(Some(2), Some(20), 20, 100)))
        .unwrap();
    let beyond = db
        .browse(&criteria, &sort, Some(PageWindow::clamped(Some(4), Some(20), 20, 100)))
        .unwrap();

    assert_eq!(ids(&first), ids(&all)[..20].to_vec());
    assert_eq!(ids(&second), ids(&all)[20..40].to_vec());
    assert!(beyond.images.is_empty());
    for page in [&all, &first, &second, &beyond] {
        assert_eq!(page.total, 50);
    }
    assert_eq!(second.total_pages(), 3);
}

#[test]
fn seeded_random_order_repeats() {
    let db = Database::open_in_memory().unwrap();
    for i in 0..20 {
        add(&db, &format!("s{i}"), &[], 0);
    }
    let criteria = Criteria::default();

    let first = db.browse(&criteria, &Sort::seeded(12345), None).unwrap();
    let again = db.browse(&criteria, &Sort::seeded(12345), None).unwrap();
    assert_eq!(ids(&first), ids(&again));

    let window = Some(PageWindow { page: 2, limit: 5 });
    let paged = db.browse(&criteria, &Sort::seeded(12345), window).unwrap();
    assert_eq!(ids(&paged), ids(&first)[5..10].to_vec());
}

#[test]
fn unknown_explicitness_level_is_ignored() {
    let db = Database::open_in_memory().unwrap();
    let safe = add(&db, "a", &["rating_general"], 0);
    add(&db, "b", &["rating_explicit"], 0);

    let mut criteria = Criteria::default();
    criteria.explicitness.include = vec!["mystery".into()];
    assert_eq!(db.browse(&criteria, &date_asc(), None).unwrap().total, 2);

    criteria.explicitness.include.push("general".into());
    assert_eq!(ids(&db.browse(&criteria, &date_asc(), None).unwrap()), vec![safe]);
}

#[test]
fn unknown_included_tag_name_matches_nothing() {
    let db = Database::open_in_memory().unwrap();
    add(&db, "a", &["cat"], 0);

    let mut criteria = Criteria::default();
    criteria.names_mut(TagCategory::General).include.push("unicorn".into());
    assert_eq!(db.browse(&criteria, &date_asc(), None).unwrap().total, 0);
}

#[test]
fn smart_album_reads_criteria_fresh() {
    let db = Database::open_in_memory().unwrap();
    let a = add(&db, "a", &[], 2);
    let b = add(&db, "b", &[], 5);
    let smart = db.create_album("best", AlbumKind::Smart, None).unwrap();

    let filter = SmartAlbumFilter {
        min_rating: 4,
        ..Default::default()
    };
    db.update_smart_album_filter(smart, &filter, None).unwrap();
    let page = db.album_images(smart, &Criteria::default(), &date_asc(), None).unwrap();
    assert_eq!(ids(&page), vec![b]);

    db.update_image(a, ImageUpdate::Rating(4)).unwrap();
    let page = db.album_images(smart, &Criteria::default(), &date_asc(), None).unwrap();
    assert_eq!(ids(&page), vec![a, b]);
}
