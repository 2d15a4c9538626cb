use crate::application::ports::{
    AuthProvider, PendingQueue, SharedStateStore, CREDENTIAL_SNAPSHOT_KEY, PENDING_SNAPSHOT_KEY,
    UPLOADED_IDS_KEY,
};
use crate::domain::entities::{PendingSnapshot, UploadedIds};
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Cross-process handoff: serializes the pending queue plus a freshly minted
/// credential into the shared store for the background task, and reconciles
/// the uploaded-ids marker that task leaves behind.
///
/// The background task never touches the local queue; only the reconcile step
/// here deletes from it, and only after seeing a clean marker.
pub struct HandoffService {
    queue: Arc<dyn PendingQueue>,
    shared: Arc<dyn SharedStateStore>,
    auth: Arc<dyn AuthProvider>,
    credential_timeout: Duration,
}

impl HandoffService {
    pub fn new(
        queue: Arc<dyn PendingQueue>,
        shared: Arc<dyn SharedStateStore>,
        auth: Arc<dyn AuthProvider>,
        credential_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            shared,
            auth,
            credential_timeout,
        }
    }

    /// Applies the uploaded-ids marker from a previous background run, then
    /// clears it. Runs before every snapshot write so already-uploaded
    /// records are never re-included.
    pub async fn reconcile(&self) -> Result<u32, AppError> {
        let raw = match self.shared.get(UPLOADED_IDS_KEY).await? {
            Some(raw) => raw,
            None => return Ok(0),
        };

        let uploaded: UploadedIds = match serde_json::from_str(&raw) {
            Ok(uploaded) => uploaded,
            Err(e) => {
                // A marker we cannot parse is dropped; the records it covered
                // are still pending locally and will sync again, which the
                // idempotent upsert absorbs.
                warn!(error = %e, "Discarding unreadable uploaded-ids marker");
                self.shared.remove(UPLOADED_IDS_KEY).await?;
                return Ok(0);
            }
        };

        let mut removed = 0;
        for id in &uploaded.ids {
            match self.queue.remove_location(id).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(id = %id, error = %e, "Reconcile dequeue failed"),
            }
        }

        self.shared.remove(UPLOADED_IDS_KEY).await?;
        if removed > 0 {
            info!(removed, "Reconciled background upload results");
        }
        Ok(removed)
    }

    /// Overwrites the shared snapshot wholesale: all pending locations for the
    /// current owner plus a short-lived credential minted for this cycle.
    /// A credential failure downgrades to a no-op; retrying without a fresh
    /// token cannot succeed.
    pub async fn write_snapshot(&self) -> Result<(), AppError> {
        let owner_id = self.auth.current_owner().await?;
        let locations = self.queue.locations_by_owner(&owner_id).await?;

        let credential = match tokio::time::timeout(
            self.credential_timeout,
            self.auth.mint_access_token(),
        )
        .await
        {
            Ok(Ok(credential)) => credential,
            Ok(Err(e)) => {
                warn!(error = %e, "Credential mint failed, skipping snapshot");
                return Ok(());
            }
            Err(_) => {
                warn!("Credential mint timed out, skipping snapshot");
                return Ok(());
            }
        };

        let snapshot = PendingSnapshot::new(owner_id, locations);
        self.shared
            .set(PENDING_SNAPSHOT_KEY, &serde_json::to_string(&snapshot)?)
            .await?;
        self.shared
            .set(
                CREDENTIAL_SNAPSHOT_KEY,
                &serde_json::to_string(&credential)?,
            )
            .await?;

        debug!(
            locations = snapshot.locations.len(),
            "Handoff snapshot written"
        );
        Ok(())
    }

    pub async fn reconcile_then_snapshot(&self) -> Result<(), AppError> {
        self.reconcile().await?;
        self.write_snapshot().await
    }

    /// Spawns the snapshot loop: a short fixed interval plus a poke on every
    /// pending-location mutation from the producers.
    pub fn schedule(&self, interval_secs: u64, mut mutations: mpsc::UnboundedReceiver<()>) {
        let service = Arc::new(self.clone());
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    event = mutations.recv() => {
                        if event.is_none() {
                            break;
                        }
                    }
                }

                if let Err(e) = service.reconcile_then_snapshot().await {
                    warn!(error = %e, "Handoff snapshot pass failed");
                }
            }
        });
    }
}

impl Clone for HandoffService {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            shared: self.shared.clone(),
            auth: self.auth.clone(),
            credential_timeout: self.credential_timeout,
        }
    }
}
