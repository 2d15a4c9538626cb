use crate::application::ports::{
    PendingQueue, PhotoArchive, PhotoMetadataUpsert, RemoteStore,
};
use crate::domain::entities::PendingPhotoRecord;
use crate::domain::value_objects::RecordState;
use crate::shared::error::AppError;
use tracing::debug;

/// Promotes one pending photo: archive the bytes to permanent local storage,
/// mirror a metadata-only record remotely, then dequeue. Each step is
/// idempotent, so a crash between steps is repaired by the next retry; a
/// failure at any step leaves the record in the queue.
pub async fn promote_pending_photo(
    queue: &dyn PendingQueue,
    archive: &dyn PhotoArchive,
    remote: &dyn RemoteStore,
    record: &PendingPhotoRecord,
) -> Result<(), AppError> {
    if record.state == RecordState::Pending {
        let path = archive.store(record).await?;
        debug!(id = %record.id, path = %path.display(), "Photo archived");
        queue
            .update_photo_state(&record.id, RecordState::Promoted)
            .await?;
    }

    remote
        .upsert_photo_metadata(&PhotoMetadataUpsert::from_record(record))
        .await?;
    queue.remove_photo(&record.id).await?;
    debug!(id = %record.id, "Photo promoted and dequeued");

    Ok(())
}
