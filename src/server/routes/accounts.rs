//! Account, session and profile endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::core::diary::{AccountProfile, EpisodeRecord, EpisodeSummary};
use crate::core::store::Page;
use crate::server::auth::AuthenticatedUser;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::ApiJson;
use crate::server::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub profile: AccountProfile,
}

#[derive(Debug, Serialize)]
pub struct PanelResponse {
    pub profile: AccountProfile,
    pub summary: EpisodeSummary,
    pub recent: Vec<EpisodeRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub content_type: String,
    /// Base64 image bytes, bare or as a `data:` URL.
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct PremiumResponse {
    pub profile: AccountProfile,
    /// `false` when the account was already premium.
    pub activated: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/panel", get(panel))
        .route("/api/profile/username", put(rename))
        .route("/api/profile/avatar", post(upload_avatar).delete(remove_avatar))
        .route("/api/premium", post(activate_premium))
}

// ============================================================================
// Handlers
// ============================================================================

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AccountProfile>)> {
    let profile = state
        .diary
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let profile = state
        .diary
        .authenticate(&req.login, &req.password)
        .await
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    let token = state.sessions.create(&profile.username).await;
    Ok(Json(LoginResponse { token, profile }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> StatusCode {
    state.sessions.revoke(&user.token).await;
    log::info!("Logged out '{}'", user.principal.username());
    StatusCode::NO_CONTENT
}

async fn panel(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<PanelResponse>> {
    let principal = &user.principal;
    let profile = state.diary.touch_last_seen(principal).await?;
    let summary = state.diary.episode_summary(principal).await;
    let recent = state
        .diary
        .list_episodes(principal, Page::recent(state.panel_recent_limit))
        .await;

    Ok(Json(PanelResponse {
        profile,
        summary,
        recent,
    }))
}

async fn rename(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<RenameRequest>,
) -> ApiResult<Json<AccountProfile>> {
    let outcome = state
        .diary
        .rename_account(&user.principal, &req.username)
        .await?;

    if outcome.previous_username != outcome.profile.username {
        state
            .sessions
            .rebind(&outcome.previous_username, &outcome.profile.username)
            .await;
    }
    Ok(Json(outcome.profile))
}

async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<AvatarRequest>,
) -> ApiResult<Json<AccountProfile>> {
    let profile = state
        .diary
        .set_avatar(&user.principal, &req.content_type, &req.data)
        .await?;
    Ok(Json(profile))
}

async fn remove_avatar(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<AccountProfile>> {
    let profile = state.diary.clear_avatar(&user.principal).await?;
    Ok(Json(profile))
}

async fn activate_premium(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<PremiumResponse>> {
    let (profile, activated) = state.diary.activate_premium(&user.principal).await?;
    Ok(Json(PremiumResponse { profile, activated }))
}
