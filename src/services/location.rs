//! Location presence engine — session event handlers.
//!
//! DESIGN
//! ======
//! Each handler follows the same sequence: resolve display name, mutate the
//! registry, then publish. Publishing is last and best-effort — a failed
//! delivery never rolls back the registry mutation, so presence state always
//! reflects the latest known location. Every scan that feeds a fan-out goes
//! through a registry snapshot, never a live iterator.
//!
//! Handlers return typed results instead of swallowing failures; the
//! transport adapter owns the decision to log-and-drop (these are
//! fire-and-forget events from the client's point of view).
//!
//! Session state machine per user: ABSENT -> (join|update) -> ACTIVE ->
//! (leave) -> ABSENT. `update` while ABSENT is a legal idempotent join.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::hub::Publisher;
use crate::location::registry::PresenceRegistry;
use crate::location::{
    LocationRecord, LocationUpdate, NEARBY_RADIUS_KM, PresenceStatus, QUEUE_LOCATION_INITIAL,
    QUEUE_LOCATION_NEARBY, TOPIC_LOCATION, geo,
};
use crate::services::profile::{ProfileError, ProfileStore};

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("unknown user: {0}")]
    UnknownUser(Uuid),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Result of a `location.join`: the stored record plus how many peers were
/// backfilled to the joining user.
#[derive(Debug)]
pub struct JoinOutcome {
    pub record: LocationRecord,
    pub backfilled: usize,
}

/// The presence engine. Owns the registry; collaborators are injected.
pub struct LocationService {
    registry: PresenceRegistry,
    profiles: Arc<dyn ProfileStore>,
    publisher: Arc<dyn Publisher>,
}

impl LocationService {
    pub fn new(profiles: Arc<dyn ProfileStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self { registry: PresenceRegistry::new(), profiles, publisher }
    }

    /// Upsert the caller's location. Broadcasts to the public topic only when
    /// the record is visible; invisible records are still stored so a later
    /// visibility toggle needs no coordinate re-send.
    ///
    /// # Errors
    ///
    /// [`LocationError::UnknownUser`] if the display-name lookup finds no
    /// profile — nothing is stored or published in that case.
    pub async fn update(&self, req: &LocationUpdate) -> Result<LocationRecord, LocationError> {
        let user_name = self
            .profiles
            .display_name(req.user_id)
            .await?
            .ok_or(LocationError::UnknownUser(req.user_id))?;

        let record = LocationRecord {
            user_id: req.user_id,
            user_name,
            latitude: req.latitude,
            longitude: req.longitude,
            timestamp: Utc::now(),
            status: PresenceStatus::Online,
            visible: req.visible,
        };
        self.registry.upsert(record.clone());

        if record.visible {
            self.publisher.publish(TOPIC_LOCATION, &payload(&record));
            info!(user = %record.user_name, "location broadcast");
        }
        Ok(record)
    }

    /// `update`, then backfill the joining user with every other visible
    /// record, delivered individually to their private queue. Peers receive
    /// nothing from the backfill itself.
    ///
    /// # Errors
    ///
    /// Same as [`LocationService::update`].
    pub async fn join(&self, req: &LocationUpdate) -> Result<JoinOutcome, LocationError> {
        let record = self.update(req).await?;

        let peers: Vec<LocationRecord> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|peer| peer.visible && peer.user_id != req.user_id)
            .collect();
        for peer in &peers {
            self.publisher
                .publish_to_user(req.user_id, QUEUE_LOCATION_INITIAL, &payload(peer));
        }

        info!(user_id = %req.user_id, peers = peers.len(), "location sharing joined");
        Ok(JoinOutcome { record, backfilled: peers.len() })
    }

    /// Remove the caller's record. An active visible record gets exactly one
    /// final broadcast with `status=offline`; leaving while absent is a
    /// no-op, not an error.
    pub fn leave(&self, user_id: Uuid) -> Option<LocationRecord> {
        let mut record = self.registry.remove(user_id)?;
        record.status = PresenceStatus::Offline;

        // Invisible records are never surfaced to others, including on the
        // way out.
        if record.visible {
            self.publisher.publish(TOPIC_LOCATION, &payload(&record));
        }
        info!(user = %record.user_name, "location sharing left");
        Some(record)
    }

    /// Point-in-time pull query: visible peers within [`NEARBY_RADIUS_KM`]
    /// (inclusive), self excluded. Matches are pushed to the caller's private
    /// queue and also returned for the transport to report a count.
    pub fn nearby(&self, user_id: Uuid, latitude: f64, longitude: f64) -> Vec<LocationRecord> {
        let matches: Vec<LocationRecord> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|peer| peer.visible && peer.user_id != user_id)
            .filter(|peer| {
                geo::distance_km(latitude, longitude, peer.latitude, peer.longitude)
                    <= NEARBY_RADIUS_KM
            })
            .collect();

        for peer in &matches {
            self.publisher
                .publish_to_user(user_id, QUEUE_LOCATION_NEARBY, &payload(peer));
        }
        matches
    }

    /// Current active-session count, visible or not.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }
}

fn payload(record: &LocationRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or_default()
}

#[cfg(test)]
#[path = "location_test.rs"]
mod tests;
