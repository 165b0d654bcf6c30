//! HTTP API endpoints.
//!
//! A read-only view of the round for clients that do not hold a socket, plus a way to start
//! a new round.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::protocol::RoundSnapshot;
use crate::state::AppState;

/// Current round snapshot.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<RoundSnapshot> {
    Json(state.snapshot().await)
}

/// Start a new round in the background.
///
/// POST /api/round
///
/// Responds immediately; progress (loading, then active or failed) is broadcast over the
/// WebSocket and visible through GET /api/state.
pub async fn post_round(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("New round requested over HTTP");
    state.spawn_round();
    (StatusCode::ACCEPTED, "Round started").into_response()
}
