//! The filter request: what to include, what to exclude, how to order and
//! which page to return.

use std::collections::{BTreeMap, BTreeSet};

use crate::db::{SmartAlbumFilter, TagCategory};
use crate::error::{GalleryError, Result};

/// User-facing explicitness levels. Each is an alias for one reserved tag in
/// the `rating` category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitnessLevel {
    General,
    Sensitive,
    Questionable,
    Explicit,
}

impl ExplicitnessLevel {
    pub const ALL: [ExplicitnessLevel; 4] = [
        ExplicitnessLevel::General,
        ExplicitnessLevel::Sensitive,
        ExplicitnessLevel::Questionable,
        ExplicitnessLevel::Explicit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplicitnessLevel::General => "general",
            ExplicitnessLevel::Sensitive => "sensitive",
            ExplicitnessLevel::Questionable => "questionable",
            ExplicitnessLevel::Explicit => "explicit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "general" => Some(ExplicitnessLevel::General),
            "sensitive" => Some(ExplicitnessLevel::Sensitive),
            "questionable" => Some(ExplicitnessLevel::Questionable),
            "explicit" => Some(ExplicitnessLevel::Explicit),
            _ => None,
        }
    }

    /// The reserved `rating` tag this level stands for.
    pub fn tag_name(&self) -> &'static str {
        match self {
            ExplicitnessLevel::General => "rating_general",
            ExplicitnessLevel::Sensitive => "rating_sensitive",
            ExplicitnessLevel::Questionable => "rating_questionable",
            ExplicitnessLevel::Explicit => "rating_explicit",
        }
    }

    /// Map requested levels to tag names, silently dropping unknown levels.
    pub fn tag_names<S: AsRef<str>>(levels: &[S]) -> Vec<String> {
        levels
            .iter()
            .filter_map(|level| Self::from_str(level.as_ref()))
            .map(|level| level.tag_name().to_string())
            .collect()
    }
}

/// Include/exclude tag names for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl NameFilter {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// A complete filter request. Every empty field means "no constraint".
///
/// Tags can be selected by id (smart albums) or by name within a category
/// (ad-hoc browsing); both kinds compile into the same predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub include_tag_ids: BTreeSet<i64>,
    pub exclude_tag_ids: BTreeSet<i64>,
    pub include_album_ids: BTreeSet<i64>,
    pub exclude_album_ids: BTreeSet<i64>,
    /// 0 means no constraint
    pub min_rating: u8,
    pub favorite_only: bool,
    /// Name filters keyed by category. The `rating` entry holds raw tag names.
    pub tag_names: BTreeMap<TagCategory, NameFilter>,
    /// Explicitness levels, mapped onto `rating` tags when compiled.
    pub explicitness: NameFilter,
    /// Tag names an image must all carry, in any category.
    pub required_tags: Vec<String>,
}

impl Criteria {
    /// Criteria selecting the explicit members of a manual album.
    pub fn album_members(album_id: i64) -> Self {
        Self {
            include_album_ids: BTreeSet::from([album_id]),
            ..Default::default()
        }
    }

    pub fn names_mut(&mut self, category: TagCategory) -> &mut NameFilter {
        self.tag_names.entry(category).or_default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.include_tag_ids.is_empty()
            && self.exclude_tag_ids.is_empty()
            && self.include_album_ids.is_empty()
            && self.exclude_album_ids.is_empty()
            && self.min_rating == 0
            && !self.favorite_only
            && self.tag_names.values().all(NameFilter::is_empty)
            && self.explicitness.is_empty()
            && self.required_tags.is_empty()
    }
}

impl From<SmartAlbumFilter> for Criteria {
    fn from(filter: SmartAlbumFilter) -> Self {
        Self {
            include_tag_ids: filter.include_tag_ids.into_iter().collect(),
            exclude_tag_ids: filter.exclude_tag_ids.into_iter().collect(),
            include_album_ids: filter.include_album_ids.into_iter().collect(),
            exclude_album_ids: filter.exclude_album_ids.into_iter().collect(),
            min_rating: filter.min_rating,
            favorite_only: filter.favorite_only,
            ..Default::default()
        }
    }
}

/// Closed set of orderings. Ties in the non-date orders fall back to the
/// image id in the same direction, so every order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    DateAsc,
    DateDesc,
    RatingDesc,
    RatingAsc,
    LikesDesc,
    LikesAsc,
    #[default]
    Random,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DateAsc => "date_asc",
            SortKey::DateDesc => "date_desc",
            SortKey::RatingDesc => "rating_desc",
            SortKey::RatingAsc => "rating_asc",
            SortKey::LikesDesc => "likes_desc",
            SortKey::LikesAsc => "likes_asc",
            SortKey::Random => "random",
        }
    }

    /// Unknown or absent keys fall back to random order.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("date_asc") => SortKey::DateAsc,
            Some("date_desc") => SortKey::DateDesc,
            Some("rating_desc") => SortKey::RatingDesc,
            Some("rating_asc") => SortKey::RatingAsc,
            Some("likes_desc") => SortKey::LikesDesc,
            Some("likes_asc") => SortKey::LikesAsc,
            _ => SortKey::Random,
        }
    }
}

/// Sort key plus the optional seed for reproducible random order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub key: SortKey,
    pub seed: Option<u64>,
}

impl Sort {
    pub fn new(key: SortKey) -> Self {
        Self { key, seed: None }
    }

    /// Random order that repeats for the same seed and the same data.
    ///
    /// Images are ordered by `(id * m) mod 2147483647`, ties broken by id,
    /// where `m` is not the seed itself but the seed passed through one
    /// splitmix64 step and reduced into `1..2147483647`. Without that step a
    /// small seed times a small id never wraps the modulus, and the order
    /// would be plain ascending id. Not cryptographically or statistically
    /// strong.
    pub fn seeded(seed: u64) -> Self {
        Self {
            key: SortKey::Random,
            seed: Some(seed),
        }
    }
}

/// Parse a random seed parameter. Blank means unseeded.
pub fn parse_seed(raw: Option<&str>) -> Result<Option<u64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| GalleryError::invalid(format!("seed must be a non-negative integer, got {s:?}"))),
    }
}

/// A 1-indexed page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    /// Build a window from raw request values: the page is clamped to at
    /// least 1, the limit to `1..=max_limit`, and an absent limit becomes
    /// `default_limit`.
    pub fn clamped(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let limit = match limit {
            Some(l) => l.clamp(1, max_limit as i64) as u32,
            None => default_limit.clamp(1, max_limit),
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}
