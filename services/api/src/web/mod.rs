pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use rest::{
    dismiss_handler, end_session_handler, get_session_handler, health_handler, register_handler,
    search_handler, start_session_handler, trends_handler,
};
use state::AppState;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/trends", get(trends_handler))
        .route("/sessions", post(start_session_handler))
        .route(
            "/sessions/{session_id}",
            get(get_session_handler).delete(end_session_handler),
        )
        .route("/sessions/{session_id}/search", post(search_handler))
        .route("/sessions/{session_id}/register", post(register_handler))
        .route("/sessions/{session_id}/dismiss", post(dismiss_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
