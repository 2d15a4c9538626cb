use crate::application::ports::media_processor::{MediaProcessor, PhotoMetadata};
use crate::application::ports::pending_queue::{LocationPatch, PendingCounts, PendingQueue};
use crate::application::ports::position_source::{PositionFix, PositionSource};
use crate::application::ports::remote_store::{
    BatchOutcome, LocationUpsert, PhotoMetadataUpsert, RemoteStore,
};
use crate::application::ports::shared_state::SharedStateStore;
use crate::application::ports::AuthProvider;
use crate::application::ports::PhotoArchive;
use crate::domain::entities::{CredentialSnapshot, PendingLocationRecord, PendingPhotoRecord};
use crate::domain::value_objects::{OwnerId, RecordId, RecordState};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn owner() -> OwnerId {
    OwnerId::parse("owner-1").unwrap()
}

#[derive(Default)]
pub struct MockQueue {
    pub locations: Mutex<Vec<PendingLocationRecord>>,
    pub photos: Mutex<Vec<PendingPhotoRecord>>,
    pub fail_writes: AtomicBool,
}

impl MockQueue {
    pub fn with_locations(records: Vec<PendingLocationRecord>) -> Self {
        Self {
            locations: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn location_ids(&self) -> Vec<RecordId> {
        self.locations
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("queue unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PendingQueue for MockQueue {
    async fn enqueue_location(&self, record: &PendingLocationRecord) -> Result<(), AppError> {
        self.check_write()?;
        self.locations.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_location(&self, id: &RecordId, patch: LocationPatch) -> Result<(), AppError> {
        self.check_write()?;
        let mut locations = self.locations.lock().unwrap();
        let record = locations
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Pending location {id}")))?;
        if let Some(wait_time) = patch.wait_time {
            record.wait_time = record.wait_time.max(wait_time);
        }
        if let Some(trip_ids) = patch.trip_ids {
            record.trip_ids = trip_ids;
        }
        Ok(())
    }

    async fn remove_location(&self, id: &RecordId) -> Result<(), AppError> {
        self.check_write()?;
        self.locations.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn locations_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingLocationRecord>, AppError> {
        Ok(self
            .locations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn enqueue_photo(&self, record: &PendingPhotoRecord) -> Result<(), AppError> {
        self.check_write()?;
        self.photos.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_photo_state(
        &self,
        id: &RecordId,
        state: RecordState,
    ) -> Result<(), AppError> {
        self.check_write()?;
        let mut photos = self.photos.lock().unwrap();
        let record = photos
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Pending photo {id}")))?;
        record.state = state;
        Ok(())
    }

    async fn remove_photo(&self, id: &RecordId) -> Result<(), AppError> {
        self.check_write()?;
        self.photos.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn photos_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<PendingPhotoRecord>, AppError> {
        Ok(self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn pending_counts(&self, owner_id: &OwnerId) -> Result<PendingCounts, AppError> {
        Ok(PendingCounts {
            locations: self.locations_by_owner(owner_id).await?.len() as u64,
            photos: self.photos_by_owner(owner_id).await?.len() as u64,
        })
    }
}

/// In-memory remote store keyed by record id, so duplicate upserts collapse
/// exactly like the real backend's merge semantics.
#[derive(Default)]
pub struct MockRemote {
    pub locations: Mutex<HashMap<String, LocationUpsert>>,
    pub photos: Mutex<HashMap<String, PhotoMetadataUpsert>>,
    pub fail_ids: Mutex<HashSet<String>>,
    pub fail_all: AtomicBool,
    pub upsert_delay: Mutex<Option<Duration>>,
    pub calls: AtomicU32,
}

impl MockRemote {
    pub fn fail_id(&self, id: &RecordId) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn location_wait(&self, id: &RecordId) -> Option<u64> {
        self.locations
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|u| u.wait_time)
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn upsert_location(&self, upsert: &LocationUpsert) -> Result<(), AppError> {
        let delay = *self.upsert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst)
            || self.fail_ids.lock().unwrap().contains(upsert.id.as_str())
        {
            return Err(AppError::Network("remote unavailable".to_string()));
        }
        self.locations
            .lock()
            .unwrap()
            .insert(upsert.id.to_string(), upsert.clone());
        Ok(())
    }

    async fn upsert_photo_metadata(&self, upsert: &PhotoMetadataUpsert) -> Result<(), AppError> {
        if self.fail_all.load(Ordering::SeqCst)
            || self.fail_ids.lock().unwrap().contains(upsert.id.as_str())
        {
            return Err(AppError::Network("remote unavailable".to_string()));
        }
        self.photos
            .lock()
            .unwrap()
            .insert(upsert.id.to_string(), upsert.clone());
        Ok(())
    }

    async fn commit_batch(
        &self,
        _credential: &CredentialSnapshot,
        writes: &[LocationUpsert],
    ) -> Result<BatchOutcome, AppError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::Network("remote unavailable".to_string()));
        }
        let mut outcome = BatchOutcome::default();
        let fail_ids = self.fail_ids.lock().unwrap().clone();
        for write in writes {
            if fail_ids.contains(write.id.as_str()) {
                outcome
                    .failed
                    .push((write.id.clone(), "rejected".to_string()));
            } else {
                self.locations
                    .lock()
                    .unwrap()
                    .insert(write.id.to_string(), write.clone());
                outcome.uploaded.push(write.id.clone());
            }
        }
        Ok(outcome)
    }
}

pub struct MockAuth {
    pub owner_id: OwnerId,
    pub fail_mint: AtomicBool,
    pub minted: AtomicU32,
}

impl Default for MockAuth {
    fn default() -> Self {
        Self {
            owner_id: owner(),
            fail_mint: AtomicBool::new(false),
            minted: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn current_owner(&self) -> Result<OwnerId, AppError> {
        Ok(self.owner_id.clone())
    }

    async fn mint_access_token(&self) -> Result<CredentialSnapshot, AppError> {
        if self.fail_mint.load(Ordering::SeqCst) {
            return Err(AppError::Auth("token endpoint unreachable".to_string()));
        }
        self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(credential(&self.owner_id))
    }
}

pub fn credential(owner_id: &OwnerId) -> CredentialSnapshot {
    CredentialSnapshot {
        access_token: "short-lived-token".to_string(),
        owner_id: owner_id.clone(),
        remote_base_url: "https://remote.test/v1".to_string(),
        minted_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MockArchive {
    pub stored: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl PhotoArchive for MockArchive {
    async fn store(&self, record: &PendingPhotoRecord) -> Result<PathBuf, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Storage("archive disk full".to_string()));
        }
        self.stored.lock().unwrap().push(record.id.to_string());
        Ok(PathBuf::from(format!("/archive/{}.jpg", record.id)))
    }
}

#[derive(Default)]
pub struct MockMedia {
    pub metadata: Mutex<PhotoMetadata>,
    pub fail_metadata: AtomicBool,
    pub fail_compress: AtomicBool,
}

#[async_trait]
impl MediaProcessor for MockMedia {
    async fn read_metadata(&self, _bytes: &[u8]) -> Result<PhotoMetadata, AppError> {
        if self.fail_metadata.load(Ordering::SeqCst) {
            return Err(AppError::MediaError("unreadable image".to_string()));
        }
        Ok(*self.metadata.lock().unwrap())
    }

    async fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, AppError> {
        if self.fail_compress.load(Ordering::SeqCst) {
            return Err(AppError::MediaError("encoder failed".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

#[derive(Default)]
pub struct MockPosition {
    pub fix: Mutex<Option<PositionFix>>,
}

#[async_trait]
impl PositionSource for MockPosition {
    async fn current_position(&self) -> Result<Option<PositionFix>, AppError> {
        Ok(*self.fix.lock().unwrap())
    }
}

#[derive(Default)]
pub struct MemorySharedState {
    pub map: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SharedStateStore for MemorySharedState {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}
