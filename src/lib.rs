pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
mod state;

pub use application::ports::{
    AuthProvider, LocationPatch, MediaProcessor, PendingQueue, PhotoArchive, PositionFix,
    PositionSource, RemoteStore, SharedStateStore,
};
pub use application::services::{
    BackgroundRunReport, BackgroundUploadTask, CaptureService, CycleOutcome, HandoffService,
    PhotoOrigin, RunOutcome, SyncService,
};
pub use domain::entities::{
    CredentialSnapshot, PendingLocationRecord, PendingPhotoRecord, PendingSnapshot, SyncPhase,
    SyncReport, UploadedIds,
};
pub use domain::value_objects::{
    CaptureTime, GeoPoint, OwnerId, RecordId, RecordState, TripId, WaitTime,
};
pub use infrastructure::auth::{StaticAuthProvider, TokenAuthProvider};
pub use infrastructure::database::{ConnectionPool, SqlitePendingQueue};
pub use infrastructure::handoff::FileSharedState;
pub use infrastructure::remote::HttpRemoteStore;
pub use shared::config::AppConfig;
pub use shared::error::AppError;
pub use state::AppState;

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
