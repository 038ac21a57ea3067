use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use super::{with_db, ApiError, ApiResult, AppState};
use crate::db::{TagCategory, TagWithCount};
use crate::query::ExplicitnessLevel;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/ratings", get(ratings))
        .route("/categories/tag/{name}", get(tag_by_name))
        .route("/categories/{kind}", get(category))
}

/// Route segment to tag category.
fn category_for(kind: &str) -> Option<TagCategory> {
    match kind {
        "tags" => Some(TagCategory::General),
        "series" => Some(TagCategory::Copyright),
        "characters" => Some(TagCategory::Character),
        "artists" => Some(TagCategory::Artist),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct TagList {
    pub tags: Vec<TagWithCount>,
}

pub async fn category(State(state): State<AppState>, Path(kind): Path<String>) -> ApiResult<Json<TagList>> {
    let category = category_for(&kind).ok_or_else(|| ApiError::NotFound(format!("unknown category {kind:?}")))?;
    let tags = with_db(&state, move |db| db.tags_by_category(category)).await?;
    Ok(Json(TagList { tags }))
}

/// The fixed explicitness levels a client can filter by.
pub async fn ratings() -> Json<Value> {
    let tags: Vec<Value> = ExplicitnessLevel::ALL
        .iter()
        .enumerate()
        .map(|(i, level)| json!({ "id": i + 1, "name": level.as_str(), "category": "rating" }))
        .collect();
    Json(json!({ "tags": tags }))
}

pub async fn tag_by_name(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<TagWithCount>> {
    let lookup = name.clone();
    with_db(&state, move |db| db.tag_by_name(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("tag {name:?} not found")))
}
