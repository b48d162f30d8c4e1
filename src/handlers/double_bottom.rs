use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::AppError;
use crate::models::pattern::{DoubleBottomResponse, Outcome, ScanSnapshot};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/double-bottom",
    responses(
        (status = 200, description = "Double bottom pattern status for all screened assets", body = DoubleBottomResponse)
    )
)]
pub async fn get_double_bottom_status(
    State(state): State<AppState>,
) -> Result<Json<DoubleBottomResponse>, AppError> {
    let patterns = state.scan_state.patterns.read().await.clone();
    Ok(Json(DoubleBottomResponse { patterns }))
}

#[utoipa::path(
    get,
    path = "/double-bottom/stream",
    responses(
        (status = 200, description = "SSE stream of scan snapshots", content_type = "text/event-stream")
    )
)]
pub async fn get_double_bottom_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let initial_patterns = state.scan_state.patterns.read().await.clone();
    let initial_snapshot = ScanSnapshot {
        as_of_ms: chrono::Utc::now().timestamp_millis() as u64,
        patterns: initial_patterns,
    };

    let initial_events = match snapshot_event(initial_snapshot) {
        Some(event) => vec![Ok(event)],
        None => Vec::new(),
    };
    let initial_stream = tokio_stream::iter(initial_events);

    let rx = state.scan_state.broadcaster.subscribe();
    let broadcast_stream = BroadcastStream::new(rx).filter_map(|message| match message {
        Ok(snapshot) => snapshot_event(snapshot).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let stream = initial_stream.chain(broadcast_stream);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn snapshot_event(snapshot: ScanSnapshot) -> Option<Event> {
    let data = serde_json::to_string(&snapshot).ok()?;
    Some(
        Event::default()
            .event("snapshot")
            .id(snapshot.as_of_ms.to_string())
            .data(data),
    )
}

/// External outcome feedback for a past pattern, keyed by its depth.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OutcomeRequest {
    /// Depth of the pattern the outcome refers to
    #[validate(range(min = 0.0, max = 1.0))]
    pub depth: f64,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OutcomeResponse {
    /// Records in the learning store after the append
    pub records: usize,
}

#[utoipa::path(
    post,
    path = "/double-bottom/outcome",
    request_body = OutcomeRequest,
    responses(
        (status = 200, description = "Outcome recorded", body = OutcomeResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    )
)]
pub async fn post_double_bottom_outcome(
    State(state): State<AppState>,
    Json(payload): Json<OutcomeRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state.estimator.learn(payload.depth, payload.outcome).await;
    let records = state.estimator.record_count().await;
    Ok(Json(OutcomeResponse { records }))
}
