use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use wayline::application::ports::remote_store::{
    BatchOutcome, LocationUpsert, PhotoMetadataUpsert,
};
use wayline::{
    AppError, CaptureTime, ConnectionPool, CredentialSnapshot, GeoPoint, OwnerId,
    PendingLocationRecord, RemoteStore, SqlitePendingQueue,
};

pub fn owner() -> OwnerId {
    OwnerId::parse("owner-1").expect("owner id")
}

pub fn credential() -> CredentialSnapshot {
    CredentialSnapshot {
        access_token: "integration-token".to_string(),
        owner_id: owner(),
        remote_base_url: "https://remote.test/v1".to_string(),
        minted_at: Utc::now(),
    }
}

pub fn location(seconds_ago: i64) -> PendingLocationRecord {
    PendingLocationRecord::new(
        owner(),
        GeoPoint::new(48.85, 2.35).expect("point"),
        CaptureTime::new(Utc::now() - Duration::seconds(seconds_ago)).expect("capture time"),
    )
}

pub async fn memory_queue() -> SqlitePendingQueue {
    let connection = ConnectionPool::from_memory().await.expect("pool");
    connection.init_schema().await.expect("schema");
    SqlitePendingQueue::new(&connection)
}

/// Remote store double that accepts everything into maps keyed by record id,
/// with an optional per-id rejection set.
#[derive(Default)]
pub struct RecordingRemote {
    pub locations: Mutex<HashMap<String, LocationUpsert>>,
    pub photos: Mutex<HashMap<String, PhotoMetadataUpsert>>,
    pub rejected: Mutex<HashSet<String>>,
    pub offline: AtomicBool,
}

impl RecordingRemote {
    pub fn reject(&self, id: &wayline::RecordId) {
        self.rejected.lock().unwrap().insert(id.to_string());
    }

    pub fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
    }

    pub fn location_wait(&self, id: &wayline::RecordId) -> Option<u64> {
        self.locations
            .lock()
            .unwrap()
            .get(id.as_str())
            .map(|u| u.wait_time)
    }

    fn rejects(&self, id: &str) -> bool {
        self.rejected.lock().unwrap().contains(id)
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn upsert_location(&self, upsert: &LocationUpsert) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) || self.rejects(upsert.id.as_str()) {
            return Err(AppError::Network("remote rejected write".to_string()));
        }
        self.locations
            .lock()
            .unwrap()
            .insert(upsert.id.to_string(), upsert.clone());
        Ok(())
    }

    async fn upsert_photo_metadata(&self, upsert: &PhotoMetadataUpsert) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) || self.rejects(upsert.id.as_str()) {
            return Err(AppError::Network("remote rejected write".to_string()));
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
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Network("remote unreachable".to_string()));
        }
        let mut outcome = BatchOutcome::default();
        for write in writes {
            if self.rejects(write.id.as_str()) {
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
