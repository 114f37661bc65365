//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything realtime flows through the single websocket endpoint; the two
//! REST routes are the lightweight query surface the original exposed for
//! clients without an open socket (the nearby pull still delivers its
//! results over the caller's private websocket queue).

pub mod location;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/location/nearby", post(location::nearby))
        .route("/api/location/active-count", get(location::active_count))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
