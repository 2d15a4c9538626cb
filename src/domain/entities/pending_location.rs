use crate::domain::value_objects::{CaptureTime, GeoPoint, OwnerId, RecordId, TripId, WaitTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GPS breadcrumb captured locally but not yet confirmed written to the
/// remote store. Mutated in place only to top up the wait time or retag
/// trips; deleted exactly once, after a confirmed remote upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingLocationRecord {
    pub id: RecordId,
    pub owner_id: OwnerId,
    pub point: GeoPoint,
    pub captured_at: CaptureTime,
    pub wait_time: WaitTime,
    pub trip_ids: Vec<TripId>,
    /// Diagnostics only, never business logic.
    pub created_at: DateTime<Utc>,
}

impl PendingLocationRecord {
    pub fn new(owner_id: OwnerId, point: GeoPoint, captured_at: CaptureTime) -> Self {
        Self {
            id: RecordId::generate(),
            owner_id,
            point,
            captured_at,
            wait_time: WaitTime::default(),
            trip_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_trip_ids(mut self, trip_ids: Vec<TripId>) -> Self {
        self.trip_ids = trip_ids;
        self
    }

    /// Wait time to send remotely at sync time: stored seconds plus everything
    /// that accrued while the record sat in the queue.
    pub fn effective_wait_time(&self, now: DateTime<Utc>) -> WaitTime {
        self.wait_time.topped_up(self.captured_at.as_datetime(), now)
    }
}
