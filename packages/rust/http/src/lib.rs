//! HTTP surface: the submission function and the admin document download.
//!
//! `/` behaves like the hosted function it replaces: `OPTIONS` answers the
//! CORS preflight, `POST` runs the intake pipeline, anything else is 405.
//! Every response from `/` carries the CORS headers.

mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use leadline_core::IntakeService;
use leadline_shared::{DocumentConfig, LeadlineError, Result};
use leadline_storage::Storage;

pub use handlers::CORS_HEADERS;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    intake: IntakeService,
    storage: Option<Arc<Storage>>,
    document: Arc<DocumentConfig>,
}

impl AppState {
    /// Document downloads read from the intake service's storage, if any.
    pub fn new(intake: IntakeService, document: DocumentConfig) -> Self {
        let storage = intake.storage().cloned();
        Self {
            intake,
            storage,
            document: Arc::new(document),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::submit)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/applications/:id/document",
            get(handlers::download_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LeadlineError::config(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LeadlineError::Network(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
