use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{parse_id, BrowseParams};
use super::{with_db, ApiError, ApiResult, AppState, PageResponse};
use crate::db::{ImageDetail, ImageUpdate, Tag, TagCategory};
use crate::library::{self, ExportReport, ExportRequest, ImportReport, OrganizeReport};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images))
        .route("/images/by-tags", get(images_by_tags))
        .route("/images/organize", post(organize))
        .route("/images/import", post(import))
        .route("/images/export", post(export))
        .route("/images/{id}", get(get_image))
        .route("/images/{id}/rating", put(update_rating))
        .route("/images/{id}/favorite", put(update_favorite))
        .route("/images/{id}/likes", put(update_likes))
        .route("/images/{id}/tags", post(add_tag).delete(remove_tag))
}

/// The whole collection, optionally filtered. Unfiltered listings get the
/// smaller page size cap.
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Json<PageResponse>> {
    let criteria = params.criteria()?;
    let sort = params.sort()?;
    let paging = &state.config.paging;
    let max_limit = if criteria.is_unconstrained() {
        paging.max_limit
    } else {
        paging.max_filtered_limit
    };
    let window = params.window(paging, max_limit);

    let page = with_db(&state, move |db| db.browse(&criteria, &sort, Some(window))).await?;
    Ok(Json(page.into()))
}

pub async fn images_by_tags(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Json<PageResponse>> {
    let tags = params.required_tags();
    let sort = params.sort()?;
    let window = params.window(&state.config.paging, state.config.paging.max_filtered_limit);

    let page = with_db(&state, move |db| db.images_by_tags(&tags, &sort, Some(window))).await?;
    Ok(Json(page.into()))
}

pub async fn get_image(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ImageDetail>> {
    let id = parse_id(&id, "image")?;
    let image = with_db(&state, move |db| db.get_image(id)).await?;
    Ok(Json(image))
}

async fn apply_update(state: &AppState, id: i64, update: ImageUpdate) -> ApiResult<Json<Value>> {
    with_db(state, move |db| db.update_image(id, update)).await?;
    Ok(Json(json!({ "id": id, update.field(): update.value() })))
}

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: i64,
}

pub async fn update_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RatingBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "image")?;
    apply_update(&state, id, ImageUpdate::rating(body.rating)?).await
}

#[derive(Debug, Deserialize)]
pub struct FavoriteBody {
    pub favorite: bool,
}

pub async fn update_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FavoriteBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "image")?;
    apply_update(&state, id, ImageUpdate::Favorite(body.favorite)).await
}

#[derive(Debug, Deserialize)]
pub struct LikesBody {
    pub likes: i64,
}

pub async fn update_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LikesBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "image")?;
    apply_update(&state, id, ImageUpdate::like_count(body.likes)?).await
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub tag: String,
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TagBody>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let id = parse_id(&id, "image")?;
    let category = body
        .category
        .as_deref()
        .map(TagCategory::parse)
        .unwrap_or(TagCategory::General);
    let tag = with_db(&state, move |db| db.add_tag_to_image(id, &body.tag, category)).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TagBody>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "image")?;
    with_db(&state, move |db| {
        db.ensure_image(id)?;
        db.remove_tag_from_image(id, &body.tag)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn organize(State(state): State<AppState>) -> ApiResult<Json<OrganizeReport>> {
    let config = state.config.clone();
    let report = tokio::task::spawn_blocking(move || {
        library::organize(
            &config.library.raw_images_dir,
            &config.library.gallery_dir,
            &config.library.image_extensions,
        )
    })
    .await
    .map_err(|e| {
        tracing::error!("Organize task failed: {}", e);
        ApiError::Internal("organize was interrupted".to_string())
    })??;
    Ok(Json(report))
}

pub async fn import(State(state): State<AppState>) -> ApiResult<Json<ImportReport>> {
    let config = state.config.clone();
    let report = with_db(&state, move |db| {
        let lib = &config.library;
        library::import(db, &lib.raw_tags_dir, &lib.tag_category_map, &lib.gallery_dir, &lib.image_extensions)
    })
    .await?;
    Ok(Json(report))
}

pub async fn export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Json<ExportReport>> {
    let config = state.config.clone();
    let report = with_db(&state, move |db| {
        library::export(db, &config.library.gallery_dir, &config.library.exports_dir, &request)
    })
    .await?;
    Ok(Json(report))
}
