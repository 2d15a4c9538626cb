use crate::application::ports::{
    AuthProvider, LocationUpsert, PendingQueue, PhotoArchive, RemoteStore,
};
use crate::application::services::promotion::promote_pending_photo;
use crate::domain::entities::{SyncPhase, SyncReport};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// What one sync cycle did. `ran` is false when a trigger was dropped by the
/// re-entrancy guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub ran: bool,
    pub synced_locations: u32,
    pub failed_locations: u32,
    pub synced_photos: u32,
    pub failed_photos: u32,
}

/// Foreground sync engine. One cycle walks Idle -> Reading -> Uploading ->
/// Reconciling -> Idle; triggers arriving mid-cycle are dropped, not queued,
/// since the next scheduled trigger picks up whatever is left.
pub struct SyncService {
    queue: Arc<dyn PendingQueue>,
    remote: Arc<dyn RemoteStore>,
    archive: Arc<dyn PhotoArchive>,
    auth: Arc<dyn AuthProvider>,
    status: Arc<RwLock<SyncReport>>,
    refresh_tx: watch::Sender<u64>,
}

impl SyncService {
    pub fn new(
        queue: Arc<dyn PendingQueue>,
        remote: Arc<dyn RemoteStore>,
        archive: Arc<dyn PhotoArchive>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let (refresh_tx, _) = watch::channel(0);
        Self {
            queue,
            remote,
            archive,
            auth,
            status: Arc::new(RwLock::new(SyncReport::default())),
            refresh_tx,
        }
    }

    /// Dependent read views (UI lists merging pending with synced records)
    /// watch this and refetch on every bump.
    pub fn subscribe_refresh(&self) -> watch::Receiver<u64> {
        self.refresh_tx.subscribe()
    }

    pub async fn report(&self) -> SyncReport {
        self.status.read().await.clone()
    }

    /// Runs one sync cycle now. Safe to interrupt and re-run: every remote
    /// write is an idempotent upsert keyed by the record id, and records are
    /// only removed after a confirmed success.
    pub async fn sync_now(&self) -> Result<CycleOutcome, AppError> {
        {
            let mut status = self.status.write().await;
            if status.is_syncing {
                debug!("Sync trigger dropped, cycle already in flight");
                return Ok(CycleOutcome::default());
            }
            status.is_syncing = true;
            status.phase = SyncPhase::Reading;
        }

        let result = self.run_cycle().await;

        let mut status = self.status.write().await;
        status.is_syncing = false;
        status.phase = SyncPhase::Idle;
        status.last_sync = Some(Utc::now().timestamp());
        match &result {
            Ok(outcome) => {
                status.synced_locations += u64::from(outcome.synced_locations);
                status.synced_photos += u64::from(outcome.synced_photos);
                if outcome.failed_locations == 0 && outcome.failed_photos == 0 {
                    status.last_error = None;
                }
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
            }
        }
        drop(status);

        result
    }

    async fn run_cycle(&self) -> Result<CycleOutcome, AppError> {
        let owner_id = self.auth.current_owner().await?;

        // Reads degrade to empty on storage failure, so a broken queue shows
        // up as "nothing pending" rather than a crashed cycle.
        let locations = self.queue.locations_by_owner(&owner_id).await?;
        let photos = self.queue.photos_by_owner(&owner_id).await?;

        if locations.is_empty() && photos.is_empty() {
            self.set_pending_counts(0, 0).await;
            return Ok(CycleOutcome {
                ran: true,
                ..Default::default()
            });
        }

        self.set_phase(SyncPhase::Uploading).await;

        let mut outcome = CycleOutcome {
            ran: true,
            ..Default::default()
        };
        let mut confirmed: Vec<RecordId> = Vec::new();
        let mut last_error: Option<String> = None;

        for record in &locations {
            let upsert = LocationUpsert::from_record(record, Utc::now());
            match self.remote.upsert_location(&upsert).await {
                Ok(()) => confirmed.push(record.id.clone()),
                Err(e) => {
                    // One bad record must not block the rest of the batch.
                    warn!(id = %record.id, error = %e, "Location upsert failed, left pending");
                    outcome.failed_locations += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        for record in &photos {
            match promote_pending_photo(
                self.queue.as_ref(),
                self.archive.as_ref(),
                self.remote.as_ref(),
                record,
            )
            .await
            {
                Ok(()) => outcome.synced_photos += 1,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Photo promotion failed, left pending");
                    outcome.failed_photos += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        self.set_phase(SyncPhase::Reconciling).await;

        for id in confirmed {
            match self.queue.remove_location(&id).await {
                Ok(()) => outcome.synced_locations += 1,
                Err(e) => {
                    // The record stays pending; the retried upsert with the
                    // same id is a safe no-op.
                    warn!(id = %id, error = %e, "Dequeue after upsert failed");
                    outcome.failed_locations += 1;
                }
            }
        }

        let counts = self.queue.pending_counts(&owner_id).await.unwrap_or_default();
        self.set_pending_counts(counts.locations, counts.photos).await;
        if let Some(message) = last_error {
            self.status.write().await.last_error = Some(message);
        }

        self.refresh_tx.send_modify(|version| *version += 1);
        info!(
            synced_locations = outcome.synced_locations,
            failed_locations = outcome.failed_locations,
            synced_photos = outcome.synced_photos,
            failed_photos = outcome.failed_photos,
            "Sync cycle finished"
        );

        Ok(outcome)
    }

    /// Fixed-interval trigger while the app is foregrounded.
    pub fn schedule(&self, interval_secs: u64) {
        let service = Arc::new(self.clone());
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));

            loop {
                interval.tick().await;

                if let Err(e) = service.sync_now().await {
                    warn!(error = %e, "Scheduled sync cycle failed");
                }
            }
        });
    }

    async fn set_phase(&self, phase: SyncPhase) {
        self.status.write().await.phase = phase;
    }

    async fn set_pending_counts(&self, locations: u64, photos: u64) {
        let mut status = self.status.write().await;
        status.pending_locations = locations;
        status.pending_photos = photos;
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            remote: self.remote.clone(),
            archive: self.archive.clone(),
            auth: self.auth.clone(),
            status: self.status.clone(),
            refresh_tx: self.refresh_tx.clone(),
        }
    }
}
