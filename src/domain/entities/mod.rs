mod pending_location;
mod pending_photo;
mod snapshot;
mod sync_report;

pub use pending_location::PendingLocationRecord;
pub use pending_photo::PendingPhotoRecord;
pub use snapshot::{CredentialSnapshot, PendingSnapshot, UploadedIds};
pub use sync_report::{SyncPhase, SyncReport};
