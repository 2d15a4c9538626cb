use crate::domain::value_objects::GeoPoint;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One fix from the continuous position stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    pub observed_at: DateTime<Utc>,
}

/// Pull side of the device position: used as the fallback when a photo has no
/// EXIF GPS. Returns `None` when no recent fix is available; implementations
/// time out rather than block capture.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Option<PositionFix>, AppError>;
}
