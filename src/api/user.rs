use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use super::params::parse_id;
use super::{with_db, ApiError, ApiResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/user/favorite/{kind}/{id}", post(add_favorite).delete(remove_favorite))
}

/// Artists, characters and series are all tags, so each kind flips the same
/// flag; the kind only has to be one the client knows about.
fn check_kind(kind: &str) -> ApiResult<()> {
    match kind {
        "tag" | "artist" | "character" | "series" => Ok(()),
        _ => Err(ApiError::NotFound(format!("unknown favorite kind {kind:?}"))),
    }
}

async fn set_favorite(state: AppState, kind: String, id: String, favorite: bool) -> ApiResult<StatusCode> {
    check_kind(&kind)?;
    let id = parse_id(&id, &kind)?;
    with_db(&state, move |db| db.set_tag_favorite(id, favorite)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    set_favorite(state, kind, id, true).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    set_favorite(state, kind, id, false).await
}
