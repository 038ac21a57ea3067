//! Predicate tree over the image collection, and the compiler that builds
//! one from [`Criteria`].

use std::collections::BTreeSet;

use super::criteria::{Criteria, ExplicitnessLevel};
use crate::db::TagCategory;

/// A set an image can belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// Has at least one of these tags.
    TagIds(Vec<i64>),
    /// Has at least one tag with one of these names, in `category` when given.
    TagNames {
        category: Option<TagCategory>,
        names: Vec<String>,
    },
    /// Is an explicit member of at least one of these albums.
    Albums(Vec<i64>),
}

impl Membership {
    pub fn is_empty(&self) -> bool {
        match self {
            Membership::TagIds(ids) | Membership::Albums(ids) => ids.is_empty(),
            Membership::TagNames { names, .. } => names.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Rating,
    Favorite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every image.
    All,
    /// Matches no image.
    Nothing,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    In(Membership),
    NotIn(Membership),
    Compare(Field, CmpOp, i64),
}

impl Predicate {
    /// Conjunction with the trivial cases folded away.
    pub fn and(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::All => {}
                Predicate::Nothing => return Predicate::Nothing,
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.pop().unwrap_or(Predicate::All),
            _ => Predicate::And(flat),
        }
    }

    /// Disjunction with the trivial cases folded away.
    pub fn or(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::Nothing => {}
                Predicate::All => return Predicate::All,
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::Nothing,
            1 => flat.pop().unwrap_or(Predicate::Nothing),
            _ => Predicate::Or(flat),
        }
    }
}

fn ids(set: &BTreeSet<i64>) -> Vec<i64> {
    set.iter().copied().collect()
}

/// Album precedence: membership in any include album overrides exclusion.
///
/// With only excludes, an image must be in none of them. With includes, an
/// image must be in at least one include album, and the exclusion term is
/// `IN OR NOT EX`, so an image that is in both an include and an exclude
/// album is kept. Returns nothing when neither set constrains anything.
pub fn album_precedence(include: &BTreeSet<i64>, exclude: &BTreeSet<i64>) -> Vec<Predicate> {
    let included = || Predicate::In(Membership::Albums(ids(include)));
    let not_excluded = || Predicate::NotIn(Membership::Albums(ids(exclude)));

    match (include.is_empty(), exclude.is_empty()) {
        (true, true) => Vec::new(),
        (true, false) => vec![not_excluded()],
        (false, true) => vec![included()],
        (false, false) => vec![included(), Predicate::or(vec![included(), not_excluded()])],
    }
}

fn push_names(parts: &mut Vec<Predicate>, category: TagCategory, include: &[String], exclude: &[String]) {
    if !include.is_empty() {
        parts.push(Predicate::In(Membership::TagNames {
            category: Some(category),
            names: include.to_vec(),
        }));
    }
    if !exclude.is_empty() {
        parts.push(Predicate::NotIn(Membership::TagNames {
            category: Some(category),
            names: exclude.to_vec(),
        }));
    }
}

/// Compile criteria into one conjunction of independent sub-predicates.
///
/// Inclusions are emitted before exclusions and scalar comparisons since
/// they usually cut the candidate set the most. The order carries no
/// meaning otherwise.
pub fn compile(criteria: &Criteria) -> Predicate {
    let mut parts = Vec::new();

    if !criteria.include_tag_ids.is_empty() {
        parts.push(Predicate::In(Membership::TagIds(ids(&criteria.include_tag_ids))));
    }

    for name in &criteria.required_tags {
        parts.push(Predicate::In(Membership::TagNames {
            category: None,
            names: vec![name.clone()],
        }));
    }

    for (category, filter) in &criteria.tag_names {
        push_names(&mut parts, *category, &filter.include, &[]);
    }

    // Unknown levels map to nothing and so contribute nothing.
    let include_levels = ExplicitnessLevel::tag_names(&criteria.explicitness.include);
    let exclude_levels = ExplicitnessLevel::tag_names(&criteria.explicitness.exclude);
    push_names(&mut parts, TagCategory::Rating, &include_levels, &[]);

    parts.extend(album_precedence(&criteria.include_album_ids, &criteria.exclude_album_ids));

    if !criteria.exclude_tag_ids.is_empty() {
        parts.push(Predicate::NotIn(Membership::TagIds(ids(&criteria.exclude_tag_ids))));
    }
    for (category, filter) in &criteria.tag_names {
        push_names(&mut parts, *category, &[], &filter.exclude);
    }
    push_names(&mut parts, TagCategory::Rating, &[], &exclude_levels);

    if criteria.min_rating > 0 {
        parts.push(Predicate::Compare(Field::Rating, CmpOp::Ge, criteria.min_rating as i64));
    }
    if criteria.favorite_only {
        parts.push(Predicate::Compare(Field::Favorite, CmpOp::Eq, 1));
    }

    Predicate::and(parts)
}
