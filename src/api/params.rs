//! Query-string and body parsing shared by the handlers.

use serde::Deserialize;

use crate::config::PagingConfig;
use crate::db::TagCategory;
use crate::error::{GalleryError, Result};
use crate::query::{parse_seed, Criteria, PageWindow, Sort, SortKey};

/// Split a comma-separated parameter, trimming entries and dropping blanks.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Path ids arrive as text so a bad one gets a JSON error body.
pub fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| GalleryError::invalid(format!("{what} id must be an integer, got {raw:?}")))
}

/// Page numbers and sizes are lenient: anything unparsable means "absent".
fn lenient(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Query string of every filtered listing.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub seed: Option<String>,
    pub include_characters: Option<String>,
    pub exclude_characters: Option<String>,
    pub include_tags: Option<String>,
    pub exclude_tags: Option<String>,
    pub include_explicitness: Option<String>,
    pub exclude_explicitness: Option<String>,
    pub include_artists: Option<String>,
    pub exclude_artists: Option<String>,
    pub include_series: Option<String>,
    pub exclude_series: Option<String>,
    pub min_rating: Option<String>,
    pub favorite: Option<String>,
    /// Only read by the tag search.
    pub tags: Option<String>,
}

impl BrowseParams {
    pub fn criteria(&self) -> Result<Criteria> {
        let mut criteria = Criteria::default();

        let groups = [
            (TagCategory::Character, &self.include_characters, &self.exclude_characters),
            (TagCategory::General, &self.include_tags, &self.exclude_tags),
            (TagCategory::Artist, &self.include_artists, &self.exclude_artists),
            (TagCategory::Copyright, &self.include_series, &self.exclude_series),
        ];
        for (category, include, exclude) in groups {
            let include = split_list(include.as_deref());
            let exclude = split_list(exclude.as_deref());
            if include.is_empty() && exclude.is_empty() {
                continue;
            }
            let names = criteria.names_mut(category);
            names.include = include;
            names.exclude = exclude;
        }

        criteria.explicitness.include = split_list(self.include_explicitness.as_deref());
        criteria.explicitness.exclude = split_list(self.exclude_explicitness.as_deref());

        if let Some(raw) = self.min_rating.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            criteria.min_rating = match raw.parse::<u8>() {
                Ok(n) if n <= 5 => n,
                _ => {
                    return Err(GalleryError::invalid(format!(
                        "min_rating must be an integer between 0 and 5, got {raw:?}"
                    )))
                }
            };
        }

        criteria.favorite_only = matches!(
            self.favorite.as_deref().map(str::trim),
            Some("true") | Some("1")
        );

        Ok(criteria)
    }

    pub fn sort(&self) -> Result<Sort> {
        Ok(Sort {
            key: SortKey::parse(self.sort.as_deref()),
            seed: parse_seed(self.seed.as_deref())?,
        })
    }

    pub fn window(&self, paging: &PagingConfig, max_limit: u32) -> PageWindow {
        PageWindow::clamped(
            lenient(self.page.as_deref()),
            lenient(self.limit.as_deref()),
            paging.default_limit,
            max_limit,
        )
    }

    pub fn required_tags(&self) -> Vec<String> {
        split_list(self.tags.as_deref())
    }
}

/// A list of ids given either as a JSON array or as a comma-separated
/// string, as older clients send them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    Ids(Vec<i64>),
    Text(String),
}

impl Default for IdList {
    fn default() -> Self {
        IdList::Ids(Vec::new())
    }
}

impl IdList {
    pub fn into_ids(self) -> Result<Vec<i64>> {
        match self {
            IdList::Ids(ids) => Ok(ids),
            IdList::Text(text) => split_list(Some(&text))
                .iter()
                .map(|raw| parse_id(raw, "list"))
                .collect(),
        }
    }
}
