//! Turn a predicate, a sort and an optional page window into a page of
//! image summaries plus the total match count.

use rusqlite::types::Value;

use super::criteria::{PageWindow, Sort, SortKey};
use super::predicate::Predicate;
use crate::db::images::{row_to_summary, IMAGE_COLUMNS};
use crate::db::{Database, ImageSummary};
use crate::error::Result;

/// Modulus for seeded ordering. A prime below 2^31, so `id * seed` stays
/// inside SQLite's 64-bit integers while ids stay below 2^32.
const SEED_MODULUS: u64 = 2_147_483_647;

/// One page of results. `window` is `None` when everything was returned.
#[derive(Debug, Clone)]
pub struct ImagePage {
    pub images: Vec<ImageSummary>,
    pub total: u64,
    pub window: Option<PageWindow>,
}

impl ImagePage {
    pub fn total_pages(&self) -> u64 {
        match self.window {
            Some(window) => window.total_pages(self.total),
            None if self.total == 0 => 0,
            None => 1,
        }
    }
}

/// Spread the seed with a splitmix64 step, then reduce it into
/// `1..SEED_MODULUS`. Without the spread, small seeds times small ids never
/// wrap the modulus and the "random" order is just ascending id.
fn seed_multiplier(seed: u64) -> i64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    match z % SEED_MODULUS {
        0 => 1,
        m => m as i64,
    }
}

/// `ORDER BY` clause for a sort, pushing any parameters it needs.
///
/// Seeded random order is the permutation `(id * seed) mod M`, ties broken
/// by id. It is reproducible for a given seed and data set, and is neither
/// cryptographically nor statistically strong.
fn order_by(sort: &Sort, params: &mut Vec<Value>) -> String {
    let clause = match sort.key {
        SortKey::DateAsc => "images.id ASC",
        SortKey::DateDesc => "images.id DESC",
        SortKey::RatingDesc => "images.rating DESC, images.id DESC",
        SortKey::RatingAsc => "images.rating ASC, images.id ASC",
        SortKey::LikesDesc => "images.like_count DESC, images.id DESC",
        SortKey::LikesAsc => "images.like_count ASC, images.id ASC",
        SortKey::Random => match sort.seed {
            Some(seed) => {
                params.push(Value::Integer(seed_multiplier(seed)));
                return format!("(images.id * ?) % {SEED_MODULUS}, images.id");
            }
            None => "RANDOM()",
        },
    };
    clause.to_string()
}

impl Database {
    /// Count and fetch the images matching `predicate`.
    ///
    /// The count ignores the window, so it is the same for every page. A
    /// page past the end is empty rather than an error.
    pub fn assemble(&self, predicate: &Predicate, sort: &Sort, window: Option<PageWindow>) -> Result<ImagePage> {
        let (where_sql, where_params) = predicate.to_sql();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM images WHERE {where_sql}"),
            rusqlite::params_from_iter(where_params.iter()),
            |row| row.get(0),
        )?;

        let mut params = where_params;
        let order = order_by(sort, &mut params);
        let mut sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE {where_sql} ORDER BY {order}");
        if let Some(window) = window {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(window.limit as i64));
            params.push(Value::Integer(window.offset() as i64));
        }

        tracing::debug!(sort = sort.key.as_str(), %where_sql, "Assembling image page");

        let mut stmt = self.conn.prepare(&sql)?;
        let images = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ImagePage {
            images,
            total: total as u64,
            window,
        })
    }
}
