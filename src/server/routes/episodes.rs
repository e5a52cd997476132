//! Episode endpoints. All scoped to the authenticated user.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;

use crate::core::diary::{EpisodeDraft, EpisodeRecord};
use crate::core::store::Page;
use crate::server::auth::AuthenticatedUser;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/episodes", post(record_episode).get(list_episodes))
        .route("/api/episodes/:id", delete(delete_episode))
}

async fn record_episode(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(draft): ApiJson<EpisodeDraft>,
) -> ApiResult<(StatusCode, Json<EpisodeRecord>)> {
    let record = state.diary.record_episode(&user.principal, &draft).await?;
    log::info!("Recorded episode {} for '{}'", record.id, record.owner);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_episodes(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Json<Vec<EpisodeRecord>> {
    let page = Page::new(query.limit, query.offset);
    Json(state.diary.list_episodes(&user.principal, page).await)
}

async fn delete_episode(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.diary.delete_episode(&user.principal, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("episode '{id}'")))
    }
}
