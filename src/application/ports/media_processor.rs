use crate::domain::value_objects::GeoPoint;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// What EXIF extraction yields for an imported image. Either field may be
/// absent; the importer falls back to the device position and "now".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhotoMetadata {
    pub point: Option<GeoPoint>,
    pub captured_at: Option<DateTime<Utc>>,
}

/// EXIF reading plus bounded re-encoding of imported images.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Never fails on images without EXIF; that is the common case.
    async fn read_metadata(&self, bytes: &[u8]) -> Result<PhotoMetadata, AppError>;

    /// Re-encodes to bound storage and bandwidth.
    async fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, AppError>;
}
