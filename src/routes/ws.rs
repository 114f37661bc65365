//! WebSocket transport — event dispatch and outbound relay.
//!
//! DESIGN
//! ======
//! On upgrade, the connection registers with the hub and enters a `select!`
//! loop: inbound client events are parsed and dispatched by event name;
//! messages published to this session (topic broadcasts or the user's
//! private queues) are forwarded out.
//!
//! Handlers are fire-and-forget from the client's point of view: a failed
//! event is logged here and dropped, never echoed back as an error. Closing
//! the socket unregisters the delivery channel only — the presence record
//! survives until an explicit `location.leave` (known stale-entry
//! limitation, kept deliberately).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::message::{ClientEvent, ServerMessage};
use crate::services;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(user_id) = params.get("user_id").and_then(|s| s.parse::<Uuid>().ok()) else {
        return (StatusCode::BAD_REQUEST, "user_id required").into_response();
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    // Per-connection channel the hub delivers into.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(256);
    let session_id = state.hub.connect(user_id, tx);

    let welcome = ServerMessage::new(
        "/queue/session",
        serde_json::json!({ "sessionId": session_id, "userId": user_id }),
    );
    if send_message(&mut socket, &welcome).await.is_err() {
        state.hub.disconnect(session_id);
        return;
    }

    info!(%session_id, %user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_event(&state, session_id, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(outbound) = rx.recv() => {
                if send_message(&mut socket, &outbound).await.is_err() {
                    break;
                }
            }
        }
    }

    // Delivery channel teardown only; the presence record stays until the
    // client sends location.leave.
    state.hub.disconnect(session_id);
    info!(%session_id, "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

#[derive(Debug, Deserialize)]
struct SubscribeEvent {
    destination: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveEvent {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearbyEvent {
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
}

/// Parse one inbound text frame and dispatch by event name. All failures are
/// terminal-and-local: logged here, nothing surfaces back to the socket.
async fn process_event(state: &AppState, session_id: Uuid, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(%session_id, error = %e, "ws: invalid inbound event");
            return;
        }
    };

    match event.event.as_str() {
        "subscribe" => match event.parse_data::<SubscribeEvent>() {
            Ok(sub) => state.hub.subscribe(session_id, &sub.destination),
            Err(e) => warn!(%session_id, error = %e, "ws: bad subscribe"),
        },
        "unsubscribe" => match event.parse_data::<SubscribeEvent>() {
            Ok(sub) => state.hub.unsubscribe(session_id, &sub.destination),
            Err(e) => warn!(%session_id, error = %e, "ws: bad unsubscribe"),
        },
        "location.update" => match event.parse_data() {
            Ok(req) => {
                if let Err(e) = state.location.update(&req).await {
                    warn!(%session_id, error = %e, "ws: location.update dropped");
                }
            }
            Err(e) => warn!(%session_id, error = %e, "ws: bad location.update"),
        },
        "location.join" => match event.parse_data() {
            Ok(req) => match state.location.join(&req).await {
                Ok(outcome) => {
                    info!(
                        %session_id,
                        user = %outcome.record.user_name,
                        peers = outcome.backfilled,
                        "ws: location.join"
                    );
                }
                Err(e) => warn!(%session_id, error = %e, "ws: location.join dropped"),
            },
            Err(e) => warn!(%session_id, error = %e, "ws: bad location.join"),
        },
        "location.leave" => match event.parse_data::<LeaveEvent>() {
            Ok(req) => {
                state.location.leave(req.user_id);
            }
            Err(e) => warn!(%session_id, error = %e, "ws: bad location.leave"),
        },
        "location.nearby" => match event.parse_data::<NearbyEvent>() {
            Ok(req) => {
                let matches = state.location.nearby(req.user_id, req.latitude, req.longitude);
                info!(%session_id, matches = matches.len(), "ws: location.nearby");
            }
            Err(e) => warn!(%session_id, error = %e, "ws: bad location.nearby"),
        },
        "chat.send" => match event.parse_data() {
            Ok(req) => {
                let result = services::chat::send_message(
                    &state.pool,
                    state.profiles.as_ref(),
                    state.hub.as_ref(),
                    &req,
                )
                .await;
                if let Err(e) = result {
                    warn!(%session_id, error = %e, "ws: chat.send dropped");
                }
            }
            Err(e) => warn!(%session_id, error = %e, "ws: bad chat.send"),
        },
        other => warn!(%session_id, event = other, "ws: unknown event"),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize outbound message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
