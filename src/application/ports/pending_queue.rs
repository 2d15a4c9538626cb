use crate::domain::entities::{PendingLocationRecord, PendingPhotoRecord};
use crate::domain::value_objects::{OwnerId, RecordId, RecordState, TripId, WaitTime};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Partial update applied to a pending location while it stays in the queue.
/// Only wait time and trip tags are ever mutated in place.
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub wait_time: Option<WaitTime>,
    pub trip_ids: Option<Vec<TripId>>,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct PendingCounts {
    pub locations: u64,
    pub photos: u64,
}

/// The durable local queue. All writes are transactional; a crash mid-write
/// must never leave a partially written record. Reads degrade to empty when
/// the underlying storage is unavailable so capture and sync keep running.
#[async_trait]
pub trait PendingQueue: Send + Sync {
    async fn enqueue_location(&self, record: &PendingLocationRecord) -> Result<(), AppError>;
    async fn update_location(&self, id: &RecordId, patch: LocationPatch) -> Result<(), AppError>;
    async fn remove_location(&self, id: &RecordId) -> Result<(), AppError>;
    async fn locations_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingLocationRecord>, AppError>;

    async fn enqueue_photo(&self, record: &PendingPhotoRecord) -> Result<(), AppError>;
    async fn update_photo_state(
        &self,
        id: &RecordId,
        state: RecordState,
    ) -> Result<(), AppError>;
    async fn remove_photo(&self, id: &RecordId) -> Result<(), AppError>;
    async fn photos_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingPhotoRecord>, AppError>;

    async fn pending_counts(&self, owner_id: &OwnerId) -> Result<PendingCounts, AppError>;
}
