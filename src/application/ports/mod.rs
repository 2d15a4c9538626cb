pub mod auth_provider;
pub mod media_processor;
pub mod pending_queue;
pub mod photo_archive;
pub mod position_source;
pub mod remote_store;
pub mod shared_state;

pub use auth_provider::AuthProvider;
pub use media_processor::{MediaProcessor, PhotoMetadata};
pub use pending_queue::{LocationPatch, PendingCounts, PendingQueue};
pub use photo_archive::PhotoArchive;
pub use position_source::{PositionFix, PositionSource};
pub use remote_store::{BatchOutcome, LocationUpsert, PhotoMetadataUpsert, RemoteStore};
pub use shared_state::{
    SharedStateStore, CREDENTIAL_SNAPSHOT_KEY, PENDING_SNAPSHOT_KEY, UPLOADED_IDS_KEY,
};
