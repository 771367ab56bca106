//! REST handlers for the rendering surface
//!
//! Every handler talks to the shared MapStore; none touch the controller
//! directly.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::controller::{SearchOutcome, ViewModel};
use crate::error::StoreClosed;
use crate::models::Coordinates;
use crate::reference::{self, ReferencePoint, STATE_CAPITALS};
use crate::store::MapStore;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ReferencePointResponse {
    pub state: &'static str,
    pub state_name: &'static str,
    pub capital: &'static str,
    pub position: Coordinates,
    pub label: String,
}

impl From<&ReferencePoint> for ReferencePointResponse {
    fn from(p: &ReferencePoint) -> Self {
        Self {
            state: p.state,
            state_name: p.state_name,
            capital: p.capital,
            position: p.coordinates,
            label: p.label(),
        }
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub outcome: &'static str,
    pub view: ViewModel,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewRequest {
    pub center: Coordinates,
    pub zoom: u8,
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = MapStore;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn unavailable(e: StoreClosed) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/map
pub async fn get_map(State(store): State<AppState>) -> ApiResult<ViewModel> {
    store.snapshot().await.map(Json).map_err(unavailable)
}

/// GET /api/v1/reference-points
pub async fn get_reference_points() -> Json<Vec<ReferencePointResponse>> {
    Json(STATE_CAPITALS.iter().map(ReferencePointResponse::from).collect())
}

/// GET /api/v1/reference-points/:state
pub async fn get_reference_point(
    Path(state): Path<String>,
) -> Result<Json<ReferencePointResponse>, (StatusCode, Json<ErrorResponse>)> {
    match reference::by_state(&state) {
        Some(point) => Ok(Json(ReferencePointResponse::from(point))),
        None => Err((StatusCode::NOT_FOUND, Json(ErrorResponse {
            error: format!("No reference point for state '{}'", state)
        }))),
    }
}

/// PUT /api/v1/query
pub async fn put_query(
    State(store): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> ApiResult<ViewModel> {
    store.set_query(&body.query).await.map(Json).map_err(unavailable)
}

/// POST /api/v1/search
///
/// The body is optional; without one the current query text is searched.
/// A body that is sent but does not decode is rejected.
pub async fn post_search(
    State(store): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<SearchResponse> {
    let query = match body {
        Ok(Json(b)) => b.query,
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => {
            return Err((
                rejection.status(),
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            ))
        }
    };
    let (outcome, view) = store.search(query).await.map_err(unavailable)?;
    let outcome = match outcome {
        SearchOutcome::Found(_) => "found",
        SearchOutcome::NotFound => "not_found",
        SearchOutcome::Unavailable => "unavailable",
    };
    Ok(Json(SearchResponse { outcome, view }))
}

/// PUT /api/v1/view
pub async fn put_view(
    State(store): State<AppState>,
    Json(body): Json<ViewRequest>,
) -> ApiResult<ViewModel> {
    store
        .update_view(body.center, body.zoom)
        .await
        .map(Json)
        .map_err(unavailable)
}

/// POST /api/v1/view/reset
pub async fn reset_view(State(store): State<AppState>) -> ApiResult<ViewModel> {
    store.reset_view().await.map(Json).map_err(unavailable)
}

/// GET /api/v1/events
pub async fn events(
    State(store): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = store.subscribe();
    // Lagged receivers skip ahead; the next message is a full snapshot anyway
    let stream = BroadcastStream::new(rx)
        .filter_map(|msg| msg.ok())
        .map(|json| Ok(Event::default().event("state").data(json)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}
