use crate::domain::value_objects::{
    CaptureTime, GeoPoint, OwnerId, RecordId, RecordState, TripId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo imported locally but not yet promoted to permanent storage and a
/// remote metadata record. The image bytes never leave the device; only the
/// metadata is mirrored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPhotoRecord {
    pub id: RecordId,
    pub owner_id: OwnerId,
    /// EXIF GPS may be absent and the device fallback may time out.
    pub point: Option<GeoPoint>,
    pub captured_at: CaptureTime,
    pub image: Vec<u8>,
    pub trip_ids: Vec<TripId>,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
}

impl PendingPhotoRecord {
    pub fn new(
        owner_id: OwnerId,
        point: Option<GeoPoint>,
        captured_at: CaptureTime,
        image: Vec<u8>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            owner_id,
            point,
            captured_at,
            image,
            trip_ids: Vec::new(),
            state: RecordState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_trip_ids(mut self, trip_ids: Vec<TripId>) -> Self {
        self.trip_ids = trip_ids;
        self
    }
}
