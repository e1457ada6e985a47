use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;

use crate::{
    error::ErrorEnvelope,
    history::HistoryStore,
    models::{FuseRequestBody, FusionRequest, FusionResult, HistoryEntry, Poster, PosterRequestBody},
    orchestrator::Orchestrator,
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub history: Arc<HistoryStore>,
    /// One fuse-and-append at a time.
    pub fuse_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, history: HistoryStore) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            history: Arc::new(history),
            fuse_lock: Arc::default(),
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    (StatusCode::BAD_REQUEST, Json(ErrorEnvelope { error: rejection.body_text() })).into_response()
}

pub async fn fuse(
    State(state): State<AppState>,
    body: Result<Json<FuseRequestBody>, JsonRejection>,
) -> Result<Json<FusionResult>, Response> {
    let Json(body) = body.map_err(bad_body)?;
    let request = FusionRequest::from_raw(body.items.as_slice()).map_err(IntoResponse::into_response)?;

    let _guard = state.fuse_lock.lock().await;
    let result = state.orchestrator.fuse(request.items()).await.map_err(IntoResponse::into_response)?;

    let entry = state.history.append(&result, request.into_items());
    tracing::info!("📚 Saved fusion to history as {}", entry.id);
    Ok(Json(result))
}

pub async fn generate_poster(
    State(state): State<AppState>,
    body: Result<Json<PosterRequestBody>, JsonRejection>,
) -> Result<Json<Poster>, Response> {
    let Json(body) = body.map_err(bad_body)?;
    let poster = state
        .orchestrator
        .generate_poster(&body.product_name, body.slogan.as_deref())
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(poster))
}

pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.list())
}

pub async fn get_history_entry(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    if let Some(entry) = state.history.get(&id) { Json(entry).into_response() } else { StatusCode::NOT_FOUND.into_response() }
}

pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.history.clear();
    tracing::info!("🧹 History cleared");
    StatusCode::NO_CONTENT
}

