// Public API for integration tests and potential library usage

pub mod api;
pub mod generator;
pub mod judge;
pub mod llm;
pub mod matcher;
pub mod protocol;
pub mod puzzle;
pub mod session;
pub mod state;
pub mod types;
pub mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Build the application router
pub fn app(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/state", get(api::get_state))
        .route("/api/round", post(api::post_round))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
