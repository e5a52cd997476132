//! Canned response endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::core::picker::SubstitutionPolicy;
use crate::server::error::ApiResult;
use crate::server::extract::ApiQuery;
use crate::server::state::AppState;

/// Paths owned by other routes; a command with one of these names is skipped.
const RESERVED_COMMANDS: &[&str] = &["api", "health", "resp"];

#[derive(Debug, Default, Deserialize)]
pub struct FillQuery {
    /// `true` fills the money placeholder; otherwise the template is raw.
    #[serde(default)]
    pub fill: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command: String,
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub file: String,
    pub category: String,
    pub response: String,
}

/// `GET /{command}` for every configured command, plus `GET /resp/:file`.
pub fn routes(commands: &[String]) -> Router<Arc<AppState>> {
    let mut router = Router::new().route("/resp/:file", get(first_category));

    for command in commands {
        if !is_routable(command) {
            log::warn!("Skipping command '{}': not usable as a route", command);
            continue;
        }

        let name = command.clone();
        router = router.route(
            &format!("/{command}"),
            get(move |state: State<Arc<AppState>>, query: ApiQuery<FillQuery>| {
                let name = name.clone();
                async move { pick_command(state, name, query).await }
            }),
        );
    }

    router
}

fn is_routable(command: &str) -> bool {
    !command.is_empty()
        && !RESERVED_COMMANDS.contains(&command)
        && command
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

async fn pick_command(
    State(state): State<Arc<AppState>>,
    command: String,
    ApiQuery(query): ApiQuery<FillQuery>,
) -> ApiResult<Json<CommandResponse>> {
    let policy = SubstitutionPolicy::from_fill(query.fill);
    let response = state.picker.pick(&command, policy).await?;
    log::debug!("Served '{}' response ({:?})", command, policy);
    Ok(Json(CommandResponse { command, response }))
}

async fn first_category(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> ApiResult<Json<FileResponse>> {
    let pick = state.picker.pick_first(&file, SubstitutionPolicy::Raw).await?;
    Ok(Json(FileResponse {
        file: pick.document,
        category: pick.category,
        response: pick.response,
    }))
}
