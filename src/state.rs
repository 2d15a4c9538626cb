use crate::application::ports::{AuthProvider, PositionFix};
use crate::application::services::{CaptureService, HandoffService, PhotoOrigin, SyncService};
use crate::domain::entities::SyncReport;
use crate::domain::value_objects::{RecordId, TripId};
use crate::infrastructure::capture::DevicePositionSource;
use crate::infrastructure::database::{ConnectionPool, SqlitePendingQueue};
use crate::infrastructure::handoff::FileSharedState;
use crate::infrastructure::media::{FilePhotoArchive, ImageMediaProcessor};
use crate::infrastructure::remote::HttpRemoteStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Wires the sync core together for the foreground process and owns the
/// lifecycle transitions the platform wrapper reports.
#[derive(Clone)]
pub struct AppState {
    pub capture: Arc<CaptureService>,
    pub sync: Arc<SyncService>,
    pub handoff: Arc<HandoffService>,
    position: DevicePositionSource,
    config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.storage.data_dir)?;
        if let Some(parent) = config.database.file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let connection = ConnectionPool::new(&config.database.file).await?;
        connection.init_schema().await?;
        let queue = Arc::new(SqlitePendingQueue::new(&connection));

        let shared = Arc::new(FileSharedState::new(
            config.handoff.shared_dir.clone(),
            config.handoff.namespace.clone(),
        ));
        let remote = Arc::new(HttpRemoteStore::new(config.remote.clone(), auth.clone())?);
        let archive = Arc::new(FilePhotoArchive::new(config.storage.data_dir.clone()));
        let media = Arc::new(ImageMediaProcessor::new(
            config.capture.max_image_dimension,
            config.capture.jpeg_quality,
        ));
        let position = DevicePositionSource::new();

        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();

        let capture = Arc::new(CaptureService::new(
            queue.clone(),
            auth.clone(),
            Arc::new(position.clone()),
            media,
            archive.clone(),
            remote.clone(),
            mutation_tx,
            config.capture.overflow_limit,
            Duration::from_secs(config.capture.position_timeout),
        ));
        let sync = Arc::new(SyncService::new(
            queue.clone(),
            remote,
            archive,
            auth.clone(),
        ));
        let handoff = Arc::new(HandoffService::new(
            queue,
            shared,
            auth,
            Duration::from_secs(config.capture.credential_timeout),
        ));

        if config.sync.auto_sync {
            sync.schedule(config.sync.sync_interval);
        }
        handoff.schedule(config.handoff.snapshot_interval, mutation_rx);

        info!("Sync core initialized");
        Ok(Self {
            capture,
            sync,
            handoff,
            position,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Platform callback for each continuous position update.
    pub async fn handle_position_fix(
        &self,
        fix: PositionFix,
        trip_ids: Vec<TripId>,
    ) -> Result<RecordId, AppError> {
        self.position.publish(fix).await;
        self.capture.record_fix(fix, trip_ids).await
    }

    pub async fn import_photo(
        &self,
        bytes: Vec<u8>,
        origin: PhotoOrigin,
        trip_ids: Vec<TripId>,
    ) -> Result<RecordId, AppError> {
        self.capture.import_photo(bytes, origin, trip_ids).await
    }

    /// App came to the foreground: reconcile any background results, then
    /// kick a sync cycle.
    pub async fn on_app_foreground(&self) -> Result<(), AppError> {
        self.handoff.reconcile().await?;
        self.sync.sync_now().await?;
        Ok(())
    }

    /// App is about to background: leave the freshest possible snapshot for
    /// the OS task, since we may be suspended before any later write lands.
    pub async fn on_app_background(&self) -> Result<(), AppError> {
        self.handoff.reconcile_then_snapshot().await
    }

    pub async fn sync_report(&self) -> SyncReport {
        self.sync.report().await
    }
}
