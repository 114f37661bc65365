//! Publish/subscribe hub over websocket connections.
//!
//! DESIGN
//! ======
//! The hub is the single delivery surface between domain services and
//! connected clients. Services see only the [`Publisher`] trait: broadcast a
//! payload to a topic, or deliver one to a specific user's queue. The hub
//! resolves those to per-connection `mpsc` senders.
//!
//! All indices are `DashMap`s so sessions on different connections never
//! contend on a global lock. Delivery is best-effort `try_send`: a slow or
//! closed session is logged and skipped, and one dead recipient never blocks
//! the rest of a fan-out.

use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::message::ServerMessage;

/// Outbound delivery surface exposed to domain services.
pub trait Publisher: Send + Sync {
    /// Broadcast a payload to every session subscribed to `destination`.
    fn publish(&self, destination: &str, body: &serde_json::Value);

    /// Deliver a payload to every session belonging to `user_id`, addressed
    /// to the given per-user queue. Subscription is not required.
    fn publish_to_user(&self, user_id: Uuid, destination: &str, body: &serde_json::Value);
}

/// One connection's outbound queue plus its owner.
struct Session {
    user_id: Uuid,
    tx: mpsc::Sender<ServerMessage>,
}

/// Connection registry and subscription index.
#[derive(Default)]
pub struct WsHub {
    /// `session_id` -> outbound sender.
    sessions: DashMap<Uuid, Session>,
    /// topic destination -> subscribed session ids.
    topics: DashMap<String, DashSet<Uuid>>,
    /// `user_id` -> session ids (a user may hold several tabs/devices).
    users: DashMap<Uuid, DashSet<Uuid>>,
}

impl WsHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its session id.
    pub fn connect(&self, user_id: Uuid, tx: mpsc::Sender<ServerMessage>) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions.insert(session_id, Session { user_id, tx });
        self.users.entry(user_id).or_default().insert(session_id);
        session_id
    }

    /// Drop a connection and every index entry pointing at it.
    ///
    /// Presence records are untouched here: leaving location sharing is an
    /// explicit `location.leave` event, not a connection-level concern.
    pub fn disconnect(&self, session_id: Uuid) {
        let Some((_, session)) = self.sessions.remove(&session_id) else {
            return;
        };

        if let Some(sessions) = self.users.get(&session.user_id) {
            sessions.remove(&session_id);
        }
        self.users.remove_if(&session.user_id, |_, sessions| sessions.is_empty());

        // Collect emptied topics first; removing while iterating would
        // deadlock on the shard lock.
        let mut emptied = Vec::new();
        for entry in self.topics.iter() {
            entry.value().remove(&session_id);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for topic in emptied {
            self.topics.remove_if(&topic, |_, set| set.is_empty());
        }
    }

    /// Subscribe a session to a broadcast destination. Unknown sessions are
    /// ignored.
    pub fn subscribe(&self, session_id: Uuid, destination: &str) {
        if !self.sessions.contains_key(&session_id) {
            return;
        }
        self.topics
            .entry(destination.to_string())
            .or_default()
            .insert(session_id);
        debug!(%session_id, destination, "hub: subscribed");
    }

    /// Drop one session's subscription to a destination.
    pub fn unsubscribe(&self, session_id: Uuid, destination: &str) {
        if let Some(set) = self.topics.get(destination) {
            set.remove(&session_id);
        }
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn deliver(&self, session_id: Uuid, msg: ServerMessage) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };
        if session.tx.try_send(msg).is_err() {
            warn!(%session_id, "hub: dropping message for slow or closed session");
        }
    }
}

impl Publisher for WsHub {
    fn publish(&self, destination: &str, body: &serde_json::Value) {
        let Some(subscribers) = self.topics.get(destination) else {
            return;
        };
        for session_id in subscribers.iter() {
            self.deliver(*session_id, ServerMessage::new(destination, body.clone()));
        }
    }

    fn publish_to_user(&self, user_id: Uuid, destination: &str, body: &serde_json::Value) {
        let Some(sessions) = self.users.get(&user_id) else {
            return;
        };
        for session_id in sessions.iter() {
            self.deliver(*session_id, ServerMessage::new(destination, body.clone()));
        }
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
