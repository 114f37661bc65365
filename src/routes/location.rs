//! REST query surface for the presence engine.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

/// `POST /api/location/nearby` — push visible peers within radius to the
/// caller's private queue; the response only acknowledges the match count.
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Json<serde_json::Value> {
    let matches = state
        .location
        .nearby(query.user_id, query.latitude, query.longitude);
    Json(serde_json::json!({ "matches": matches.len() }))
}

/// `GET /api/location/active-count` — liveness/metrics read of the registry.
pub async fn active_count(State(state): State<AppState>) -> Json<usize> {
    Json(state.location.active_count())
}
