use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{parse_id, BrowseParams, IdList};
use super::{with_db, ApiError, ApiResult, AppState, PageResponse};
use crate::db::{Album, AlbumKind, SmartAlbumFilter};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route("/albums/{id}", axum::routing::delete(delete_album))
        .route("/albums/{id}/cover", put(set_cover))
        .route("/albums/{id}/images", get(album_images).post(add_images))
        .route("/albums/{id}/images/{image_id}", post(add_image).delete(remove_image))
        .route("/albums/{id}/filters", get(get_filters).put(update_filters))
}

pub async fn list_albums(State(state): State<AppState>) -> ApiResult<Json<Vec<Album>>> {
    let albums = with_db(&state, |db| db.list_albums()).await?;
    Ok(Json(albums))
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumBody {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub cover_image_id: Option<i64>,
}

pub async fn create_album(
    State(state): State<AppState>,
    Json(body): Json<CreateAlbumBody>,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let kind = match body.kind.as_deref().map(str::trim) {
        None | Some("") => AlbumKind::Manual,
        Some(raw) => AlbumKind::from_str(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("album type must be manual or smart, got {raw:?}")))?,
    };

    let album = with_db(&state, move |db| {
        let id = db.create_album(&body.name, kind, body.cover_image_id)?;
        db.get_album(id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn delete_album(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "album")?;
    with_db(&state, move |db| db.delete_album(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CoverBody {
    pub cover_image_id: Option<i64>,
}

pub async fn set_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CoverBody>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "album")?;
    with_db(&state, move |db| db.set_album_cover(id, body.cover_image_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Album contents, with the same filters as the main listing layered on.
pub async fn album_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Json<PageResponse>> {
    let id = parse_id(&id, "album")?;
    let request = params.criteria()?;
    let sort = params.sort()?;
    let window = params.window(&state.config.paging, state.config.paging.max_filtered_limit);

    let page = with_db(&state, move |db| db.album_images(id, &request, &sort, Some(window))).await?;
    Ok(Json(page.into()))
}

#[derive(Debug, Deserialize)]
pub struct AddImagesBody {
    pub image_ids: IdList,
}

pub async fn add_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddImagesBody>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "album")?;
    let image_ids = body.image_ids.into_ids()?;
    if image_ids.is_empty() {
        return Err(ApiError::BadRequest("no images given".to_string()));
    }
    let added = with_db(&state, move |db| db.add_images_to_album(id, &image_ids)).await?;
    Ok(Json(json!({ "added": added })))
}

pub async fn add_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "album")?;
    let image_id = parse_id(&image_id, "image")?;
    with_db(&state, move |db| db.add_image_to_album(id, image_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "album")?;
    let image_id = parse_id(&image_id, "image")?;
    with_db(&state, move |db| db.remove_image_from_album(id, image_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_filters(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SmartAlbumFilter>> {
    let id = parse_id(&id, "album")?;
    let filter = with_db(&state, move |db| db.smart_album_criteria(id)).await?;
    Ok(Json(filter))
}

/// New smart album criteria. Id lists may be arrays or comma-separated
/// strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FiltersBody {
    pub include_tag_ids: IdList,
    pub exclude_tag_ids: IdList,
    pub include_album_ids: IdList,
    pub exclude_album_ids: IdList,
    pub min_rating: i64,
    pub favorite_only: bool,
    pub cover_image_id: Option<i64>,
}

impl FiltersBody {
    fn into_filter(self) -> crate::error::Result<(SmartAlbumFilter, Option<i64>)> {
        let min_rating = u8::try_from(self.min_rating)
            .ok()
            .filter(|r| *r <= 5)
            .ok_or_else(|| {
                crate::error::GalleryError::invalid(format!(
                    "min_rating must be between 0 and 5, got {}",
                    self.min_rating
                ))
            })?;
        let filter = SmartAlbumFilter {
            include_tag_ids: self.include_tag_ids.into_ids()?,
            exclude_tag_ids: self.exclude_tag_ids.into_ids()?,
            include_album_ids: self.include_album_ids.into_ids()?,
            exclude_album_ids: self.exclude_album_ids.into_ids()?,
            min_rating,
            favorite_only: self.favorite_only,
        };
        Ok((filter, self.cover_image_id))
    }
}

pub async fn update_filters(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FiltersBody>,
) -> ApiResult<Json<SmartAlbumFilter>> {
    let id = parse_id(&id, "album")?;
    let (filter, cover) = body.into_filter()?;
    let stored = with_db(&state, move |db| {
        db.update_smart_album_filter(id, &filter, cover)?;
        db.smart_album_criteria(id)
    })
    .await?;
    Ok(Json(stored))
}
