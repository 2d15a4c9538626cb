use crate::application::ports::position_source::{PositionFix, PositionSource};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// How long a fix stays good enough to serve as a photo's GPS fallback.
const FIX_STALENESS_SECONDS: i64 = 120;

/// Pull-side view of the platform position stream. The platform callback
/// publishes each fix here; `current_position` hands out the latest one while
/// it is still fresh.
#[derive(Clone, Default)]
pub struct DevicePositionSource {
    latest: Arc<RwLock<Option<PositionFix>>>,
}

impl DevicePositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, fix: PositionFix) {
        *self.latest.write().await = Some(fix);
    }
}

#[async_trait]
impl PositionSource for DevicePositionSource {
    async fn current_position(&self) -> Result<Option<PositionFix>, AppError> {
        let latest = *self.latest.read().await;
        Ok(latest.filter(|fix| {
            Utc::now() - fix.observed_at < Duration::seconds(FIX_STALENESS_SECONDS)
        }))
    }
}
