//! Wire message types for the websocket layer.
//!
//! DESIGN
//! ======
//! Traffic is asymmetric. Clients send [`ClientEvent`] envelopes — an event
//! name plus a flat data object — and the WS handler dispatches on the event
//! name (`subscribe`, `location.*`, `chat.send`) without inspecting `data`.
//! Everything the server sends is a [`ServerMessage`]: a destination string
//! (a broadcast topic like `/topic/location/nearby` or a per-user queue like
//! `/queue/location/initial`) plus an opaque JSON body. Destinations keep the
//! path shapes of the original STOMP wire contract so existing clients can
//! subscribe unchanged.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// Inbound envelope from a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    pub event: String,
    #[serde(default)]
    pub data: Data,
}

impl ClientEvent {
    /// Reinterpret the flat `data` object as a typed request.
    ///
    /// # Errors
    ///
    /// Returns a serde error if required fields are missing or mistyped.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(&self.data)?)
    }
}

/// Outbound envelope: a payload addressed to one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    pub destination: String,
    pub body: serde_json::Value,
}

impl ServerMessage {
    pub fn new(destination: impl Into<String>, body: serde_json::Value) -> Self {
        Self { destination: destination.into(), body }
    }
}

// =============================================================================
// TESTS
// =============================================================================
