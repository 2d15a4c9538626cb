use crate::domain::entities::PendingPhotoRecord;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Permanent local storage a pending photo is promoted into.
#[async_trait]
pub trait PhotoArchive: Send + Sync {
    async fn store(&self, record: &PendingPhotoRecord) -> Result<PathBuf, AppError>;
}
