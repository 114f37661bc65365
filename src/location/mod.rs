//! Live location sharing domain types.
//!
//! DESIGN
//! ======
//! One [`LocationRecord`] per user currently sharing their position, held in
//! the in-memory [`registry::PresenceRegistry`]. Records are created by
//! `location.join`/`location.update` events, removed by `location.leave`,
//! and are never persisted: the registry is process-local state. A client
//! that disconnects without sending `leave` keeps its last record — there is
//! intentionally no TTL or disconnect hook (known limitation).
//!
//! Wire field names keep the original client contract: `userId`, `userName`,
//! `visible`, timestamps as RFC 3339.

pub mod geo;
pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public broadcast topic for location updates and offline notices.
pub const TOPIC_LOCATION: &str = "/topic/location/nearby";

/// Per-user queue carrying the on-join backfill of already-active peers.
pub const QUEUE_LOCATION_INITIAL: &str = "/queue/location/initial";

/// Per-user queue carrying nearby-query results.
pub const QUEUE_LOCATION_NEARBY: &str = "/queue/location/nearby";

/// Radius for nearby queries, inclusive boundary.
pub const NEARBY_RADIUS_KM: f64 = 1.0;

/// Whether a sharing user is live or emitting its final leave notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    /// Set only on the last broadcast before the record is dropped.
    Offline,
}

/// One currently-active sharing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub user_id: Uuid,
    /// Display name, resolved once at update time.
    pub user_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub status: PresenceStatus,
    /// Governs both public broadcast and eligibility in peers' queries.
    pub visible: bool,
}

/// Inbound `location.join` / `location.update` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub visible: bool,
}
