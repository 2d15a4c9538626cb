use crate::application::ports::photo_archive::PhotoArchive;
use crate::domain::entities::PendingPhotoRecord;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Permanent photo storage under `<data_dir>/photos/<owner>/<id>.jpg`.
/// Writing the same record twice overwrites with identical bytes, so a
/// retried promotion is harmless.
pub struct FilePhotoArchive {
    root: PathBuf,
}

impl FilePhotoArchive {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join("photos"),
        }
    }
}

#[async_trait]
impl PhotoArchive for FilePhotoArchive {
    async fn store(&self, record: &PendingPhotoRecord) -> Result<PathBuf, AppError> {
        let dir = self.root.join(record.owner_id.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.jpg", record.id));
        tokio::fs::write(&path, &record.image).await?;
        debug!(path = %path.display(), "Photo bytes archived");
        Ok(path)
    }
}
