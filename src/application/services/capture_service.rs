use crate::application::ports::{
    AuthProvider, MediaProcessor, PendingQueue, PhotoArchive, PositionFix, PositionSource,
    RemoteStore,
};
use crate::application::services::promotion::promote_pending_photo;
use crate::domain::entities::{PendingLocationRecord, PendingPhotoRecord};
use crate::domain::value_objects::{CaptureTime, RecordId, TripId};
use crate::shared::error::AppError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Where an imported photo originated. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOrigin {
    FilePicker,
    Camera,
    LibraryScan,
}

/// Capture producers: the location watcher sink and the photo importer.
///
/// Every position fix becomes one queue record, durably stored before any
/// network attempt. Photos get EXIF extraction with device-position and
/// current-time fallbacks, bounded re-encoding, and an optimistic enqueue
/// followed by asynchronous promotion.
pub struct CaptureService {
    queue: Arc<dyn PendingQueue>,
    auth: Arc<dyn AuthProvider>,
    position: Arc<dyn PositionSource>,
    media: Arc<dyn MediaProcessor>,
    archive: Arc<dyn PhotoArchive>,
    remote: Arc<dyn RemoteStore>,
    mutations: mpsc::UnboundedSender<()>,
    /// Records that failed durable enqueue, kept in memory for a same-session
    /// retry on the next fix. Lost on crash; the queue write error already
    /// surfaced to the caller.
    overflow: Arc<Mutex<VecDeque<PendingLocationRecord>>>,
    overflow_limit: usize,
    position_timeout: Duration,
}

impl CaptureService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn PendingQueue>,
        auth: Arc<dyn AuthProvider>,
        position: Arc<dyn PositionSource>,
        media: Arc<dyn MediaProcessor>,
        archive: Arc<dyn PhotoArchive>,
        remote: Arc<dyn RemoteStore>,
        mutations: mpsc::UnboundedSender<()>,
        overflow_limit: usize,
        position_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            auth,
            position,
            media,
            archive,
            remote,
            mutations,
            overflow: Arc::new(Mutex::new(VecDeque::new())),
            overflow_limit,
            position_timeout,
        }
    }

    /// Handles one fix from the continuous position stream. Enqueues a new
    /// pending record immediately; no batching at capture time.
    pub async fn record_fix(
        &self,
        fix: PositionFix,
        trip_ids: Vec<TripId>,
    ) -> Result<RecordId, AppError> {
        self.retry_overflow().await;

        let owner_id = self.auth.current_owner().await?;
        let captured_at =
            CaptureTime::new(fix.observed_at).unwrap_or_else(|_| CaptureTime::now());
        let record = PendingLocationRecord::new(owner_id, fix.point, captured_at)
            .with_trip_ids(trip_ids);
        let id = record.id.clone();

        match self.queue.enqueue_location(&record).await {
            Ok(()) => {
                debug!(id = %id, "Location fix enqueued");
                let _ = self.mutations.send(());
                Ok(id)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Durable enqueue failed, holding fix in memory");
                let mut overflow = self.overflow.lock().await;
                if overflow.len() >= self.overflow_limit {
                    overflow.pop_front();
                }
                overflow.push_back(record);
                Err(e)
            }
        }
    }

    /// Imports one photo: EXIF extraction with fallbacks, bounded re-encode,
    /// optimistic enqueue, then asynchronous promotion. A promotion failure
    /// leaves the record pending for the sync engine to retry.
    pub async fn import_photo(
        self: &Arc<Self>,
        bytes: Vec<u8>,
        origin: PhotoOrigin,
        trip_ids: Vec<TripId>,
    ) -> Result<RecordId, AppError> {
        let owner_id = self.auth.current_owner().await?;

        let metadata = match self.media.read_metadata(&bytes).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "EXIF extraction failed, using fallbacks");
                Default::default()
            }
        };

        let point = match metadata.point {
            Some(point) => Some(point),
            None => self.device_position_fallback().await,
        };
        let captured_at = metadata
            .captured_at
            .and_then(|t| CaptureTime::new(t).ok())
            .unwrap_or_else(CaptureTime::now);

        let image = match self.media.compress(&bytes).await {
            Ok(compressed) => compressed,
            Err(e) => {
                warn!(error = %e, "Image compression failed, storing original bytes");
                bytes
            }
        };

        let record =
            PendingPhotoRecord::new(owner_id, point, captured_at, image).with_trip_ids(trip_ids);
        let id = record.id.clone();

        // Durable and visible in the UI before any promotion attempt.
        self.queue.enqueue_photo(&record).await?;
        debug!(id = %id, ?origin, "Photo enqueued");

        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = promote_pending_photo(
                service.queue.as_ref(),
                service.archive.as_ref(),
                service.remote.as_ref(),
                &record,
            )
            .await
            {
                warn!(id = %record.id, error = %e, "Photo promotion failed, left pending");
            }
        });

        Ok(id)
    }

    async fn device_position_fallback(&self) -> Option<crate::domain::value_objects::GeoPoint> {
        match tokio::time::timeout(self.position_timeout, self.position.current_position()).await
        {
            Ok(Ok(fix)) => fix.map(|f| f.point),
            Ok(Err(e)) => {
                warn!(error = %e, "Device position unavailable for photo fallback");
                None
            }
            Err(_) => {
                warn!("Device position fallback timed out");
                None
            }
        }
    }

    async fn retry_overflow(&self) {
        let mut overflow = self.overflow.lock().await;
        while let Some(record) = overflow.pop_front() {
            if let Err(e) = self.queue.enqueue_location(&record).await {
                warn!(id = %record.id, error = %e, "Overflow retry failed");
                overflow.push_front(record);
                return;
            }
            debug!(id = %record.id, "Overflow fix durably enqueued");
            let _ = self.mutations.send(());
        }
    }

    #[cfg(test)]
    pub(crate) async fn overflow_len(&self) -> usize {
        self.overflow.lock().await.len()
    }
}
