//! HTTP dispatcher
//!
//! Exposes the response picker and the diary over JSON.
//!
//! ## Endpoints
//! - `GET /health` - Health check
//! - `GET /{command}` - Random response for a configured command (`?fill=true` fills money)
//! - `GET /resp/:file` - Random response from a document's first category
//! - `POST /api/register`, `POST /api/login`, `POST /api/logout`
//! - `GET /api/panel` - Profile, totals and recent episodes
//! - `POST|GET /api/episodes`, `DELETE /api/episodes/:id`
//! - `PUT /api/profile/username`, `POST|DELETE /api/profile/avatar`, `POST /api/premium`
//!
//! `/api` routes other than register and login need `Authorization: Bearer <token>`.
//! Malformed bodies and query strings get the same error shape as any other failure.

pub mod auth;
pub mod error;
pub mod extract;
pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use session::SessionRegistry;
pub use state::AppState;

/// Build the full router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(routes::responses::routes(&state.commands))
        .merge(routes::accounts::routes())
        .merge(routes::episodes::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// The dispatcher bound to one address.
pub struct DiaryServer {
    addr: String,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl DiaryServer {
    pub fn new(addr: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            addr: addr.into(),
            state,
            shutdown_tx: None,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve in the foreground until `shutdown` resolves.
    pub async fn serve<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        log::info!("Listening on {}", self.url());

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        log::info!("Server stopped");
        Ok(())
    }

    /// Serve on a background task; stop with [`stop`](Self::stop).
    pub async fn start(&mut self) -> ServerResult<()> {
        if self.shutdown_tx.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = self.bind().await?;
        let app = router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let url = self.url();

        tokio::spawn(async move {
            log::info!("Listening on {}", url);
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    log::info!("Server shutting down");
                })
                .await;
            if let Err(e) = result {
                log::error!("Server error: {}", e);
            }
        });

        self.shutdown_tx = Some(shutdown_tx);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            log::info!("Server stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    async fn bind(&self) -> ServerResult<tokio::net::TcpListener> {
        tokio::net::TcpListener::bind(self.addr.as_str())
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.clone(),
                source,
            })
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "version": crate::VERSION }))
}
