//! In-memory presence registry.
//!
//! DESIGN
//! ======
//! A sharded concurrent map keyed by user id. Sessions on different users
//! never serialize against each other; a single key's history is
//! linearizable (the later completed upsert wins). Scans always go through
//! [`PresenceRegistry::snapshot`], which copies the current records so a
//! fan-out can never observe a torn read while other sessions keep mutating.

use dashmap::DashMap;
use uuid::Uuid;

use super::LocationRecord;

/// Concurrent map of currently-sharing users. Construct once per process and
/// inject by reference — never a global.
#[derive(Default)]
pub struct PresenceRegistry {
    records: DashMap<Uuid, LocationRecord>,
}

impl PresenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace-or-insert the record for its user. Upsert semantics keep the
    /// at-most-one-record-per-user invariant without a read-modify-write.
    pub fn upsert(&self, record: LocationRecord) {
        self.records.insert(record.user_id, record);
    }

    /// Atomically remove and return a user's record. Absent key is not an
    /// error.
    pub fn remove(&self, user_id: Uuid) -> Option<LocationRecord> {
        self.records.remove(&user_id).map(|(_, record)| record)
    }

    /// Current record for one user, cloned out of the map.
    #[must_use]
    pub fn get(&self, user_id: Uuid) -> Option<LocationRecord> {
        self.records.get(&user_id).map(|r| r.value().clone())
    }

    /// Point-in-time copy of all records, safe to iterate while concurrent
    /// upserts and removes proceed.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LocationRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of active sharing sessions (visible or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::PresenceStatus;
    use chrono::Utc;

    fn record(user_id: Uuid, latitude: f64) -> LocationRecord {
        LocationRecord {
            user_id,
            user_name: "tester".into(),
            latitude,
            longitude: 126.978,
            timestamp: Utc::now(),
            status: PresenceStatus::Online,
            visible: true,
        }
    }

    #[test]
    fn upsert_replaces_never_duplicates() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        registry.upsert(record(user, 37.1));
        registry.upsert(record(user, 37.2));
        registry.upsert(record(user, 37.3));

        assert_eq!(registry.len(), 1);
        let current = registry.get(user).unwrap();
        assert!((current.latitude - 37.3).abs() < f64::EPSILON);
    }

    #[test]
    fn remove_returns_record_once() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        registry.upsert(record(user, 37.5));

        let removed = registry.remove(user).expect("record should be present");
        assert_eq!(removed.user_id, user);
        assert!(registry.remove(user).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        registry.upsert(record(user, 37.5));

        let snap = registry.snapshot();
        registry.remove(user);
        registry.upsert(record(Uuid::new_v4(), 38.0));

        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].user_id, user);
    }

    #[test]
    fn concurrent_upserts_to_distinct_keys_all_land() {
        let registry = std::sync::Arc::new(PresenceRegistry::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    registry.upsert(record(Uuid::new_v4(), 37.0 + f64::from(i)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 16 * 50);
    }
}
