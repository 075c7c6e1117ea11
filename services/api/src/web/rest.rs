//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    HostIdentityPayload, RegisterRequest, ResultLinkView, SearchRequest, SearchResponse,
    SessionView, StartSessionRequest, TrendView,
};
use crate::web::state::{AppState, LiveSession};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use topic_core::domain::Keyword;
use topic_core::flow::{RegistrationError, SearchOutcome};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        start_session_handler,
        get_session_handler,
        end_session_handler,
        search_handler,
        register_handler,
        dismiss_handler,
        trends_handler,
        health_handler,
    ),
    components(
        schemas(
            StartSessionRequest,
            HostIdentityPayload,
            SessionView,
            SearchRequest,
            SearchResponse,
            ResultLinkView,
            TrendView,
            RegisterRequest,
        )
    ),
    tags(
        (name = "Topic API", description = "Keyword search links, registration gate and trending keywords.")
    )
)]
pub struct ApiDoc;

type HandlerError = (StatusCode, String);

fn session_view(session_id: Uuid, live: &LiveSession) -> SessionView {
    SessionView {
        session_id,
        search_count: live.state.search_count,
        pending_registration: live.state.pending_registration,
        has_identity: live.identity.is_some(),
        started_at: live.started_at,
    }
}

async fn find_session(
    app_state: &AppState,
    session_id: Uuid,
) -> Result<Arc<Mutex<LiveSession>>, HandlerError> {
    app_state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session {} not found", session_id)))
}

//=========================================================================================
// Session Lifecycle
//=========================================================================================

/// Start a session for one mini-app view.
///
/// The host identity, if the embedding platform supplied one, is captured here
/// and used for every gate check in this session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionView)
    )
)]
pub async fn start_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let identity = req.identity.map(Into::into);
    let session_id = app_state.sessions.start(identity).await;
    let session = find_session(&app_state, session_id).await?;
    let view = session_view(session_id, &*session.lock().await);

    info!(
        "Started session {} (identity: {})",
        session_id,
        if view.has_identity { "yes" } else { "no" }
    );
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "Current session state", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, HandlerError> {
    let session = find_session(&app_state, session_id).await?;
    let view = session_view(session_id, &*session.lock().await);
    Ok(Json(view))
}

/// End a session. Store writes already in flight are left to finish.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn end_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    if app_state.sessions.end(session_id).await {
        info!("Ended session {}", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Session {} not found", session_id)))
    }
}

//=========================================================================================
// Search and Registration
//=========================================================================================

/// Run a keyword search.
///
/// Returns the platform links, or asks the client to show the registration
/// prompt once the free searches are used up.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/search",
    request_body = SearchRequest,
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "Search completed or deferred for registration", body = SearchResponse),
        (status = 400, description = "Keyword too short"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Another search is still running for this session")
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, HandlerError> {
    let keyword =
        Keyword::parse(&req.keyword).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let session = find_session(&app_state, session_id).await?;
    let mut live = session.try_lock().map_err(|_| {
        warn!("Rejected overlapping search for session {}", session_id);
        (
            StatusCode::CONFLICT,
            "A search is already running for this session".to_string(),
        )
    })?;
    let live = &mut *live;

    let outcome = app_state
        .flow
        .run_search(&keyword, &mut live.state, live.identity.as_ref())
        .await;

    let response = match outcome {
        SearchOutcome::Completed { results, trends } => SearchResponse::Completed {
            results: results.into_iter().map(Into::into).collect(),
            trends: trends.into_iter().map(Into::into).collect(),
            search_count: live.state.search_count,
        },
        SearchOutcome::Deferred => {
            info!("Search deferred for session {} pending registration", session_id);
            SearchResponse::RegistrationRequired {
                search_count: live.state.search_count,
            }
        }
    };
    Ok(Json(response))
}

/// Complete registration for the session's host identity.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/register",
    request_body = RegisterRequest,
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 201, description = "Registered (or already registered)", body = SessionView),
        (status = 400, description = "The session has no host identity"),
        (status = 404, description = "Unknown session"),
        (status = 503, description = "The store is unavailable; retry")
    )
)]
pub async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = find_session(&app_state, session_id).await?;
    let mut live = session.lock().await;
    let live = &mut *live;

    app_state
        .flow
        .register(&mut live.state, live.identity.as_ref(), req.into())
        .await
        .map_err(|e| match e {
            RegistrationError::MissingIdentity => (StatusCode::BAD_REQUEST, e.to_string()),
            RegistrationError::Store(_) => {
                error!("Failed to register session {}: {:?}", session_id, e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Registration could not be saved, please try again".to_string(),
                )
            }
        })?;

    Ok((StatusCode::CREATED, Json(session_view(session_id, live))))
}

/// Close the registration prompt without registering.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/dismiss",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "Prompt dismissed", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn dismiss_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, HandlerError> {
    let session = find_session(&app_state, session_id).await?;
    let mut live = session.lock().await;
    live.state.dismiss_registration();
    Ok(Json(session_view(session_id, &live)))
}

//=========================================================================================
// Trends and Health
//=========================================================================================

/// The current trending keywords. Empty when the store cannot be read.
#[utoipa::path(
    get,
    path = "/trends",
    responses(
        (status = 200, description = "Trending keywords, most searched first", body = [TrendView])
    )
)]
pub async fn trends_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<TrendView>> {
    let trends = app_state.flow.trends().await;
    Json(trends.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
