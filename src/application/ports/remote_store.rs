use crate::domain::entities::{CredentialSnapshot, PendingLocationRecord, PendingPhotoRecord};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-record merge/set payload for a location, keyed by the local record id.
/// The same id may legitimately be written more than once (wait-time top-ups,
/// retried batches), so this must never be expressed as an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpsert {
    pub id: RecordId,
    pub owner_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: String,
    pub wait_time: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trip_ids: Vec<String>,
}

impl LocationUpsert {
    /// Builds the wire payload, applying the wait-time top-up at this moment.
    pub fn from_record(record: &PendingLocationRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            owner_id: record.owner_id.to_string(),
            latitude: record.point.latitude,
            longitude: record.point.longitude,
            captured_at: record.captured_at.to_rfc3339(),
            wait_time: record.effective_wait_time(now).as_seconds(),
            trip_ids: record.trip_ids.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Metadata-only mirror of a photo. Image bytes stay on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadataUpsert {
    pub id: RecordId,
    pub owner_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub captured_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trip_ids: Vec<String>,
}

impl PhotoMetadataUpsert {
    pub fn from_record(record: &PendingPhotoRecord) -> Self {
        Self {
            id: record.id.clone(),
            owner_id: record.owner_id.to_string(),
            latitude: record.point.map(|p| p.latitude),
            longitude: record.point.map(|p| p.longitude),
            captured_at: record.captured_at.to_rfc3339(),
            trip_ids: record.trip_ids.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Outcome of one batched write, reported per record so callers can
/// distinguish full from partial success.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub uploaded: Vec<RecordId>,
    pub failed: Vec<(RecordId, String)>,
}

impl BatchOutcome {
    pub fn fully_successful(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The remote append/update store. Upserts are idempotent: calling twice with
/// identical content must equal a single call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert_location(&self, upsert: &LocationUpsert) -> Result<(), AppError>;
    async fn upsert_photo_metadata(&self, upsert: &PhotoMetadataUpsert) -> Result<(), AppError>;

    /// One batched request for the background path, authenticated with the
    /// handed-off credential rather than the foreground auth collaborator.
    async fn commit_batch(
        &self,
        credential: &CredentialSnapshot,
        writes: &[LocationUpsert],
    ) -> Result<BatchOutcome, AppError>;
}
