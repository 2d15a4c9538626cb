use crate::shared::error::AppError;
use async_trait::async_trait;

/// Slot holding the serialized pending queue for the background context.
pub const PENDING_SNAPSHOT_KEY: &str = "pending-snapshot";
/// Slot holding the short-lived credential minted for one handoff cycle.
pub const CREDENTIAL_SNAPSHOT_KEY: &str = "credential-snapshot";
/// Slot the background task writes its confirmed record ids into.
pub const UPLOADED_IDS_KEY: &str = "uploaded-ids";

/// Platform-level shared key-value store, the only synchronization point
/// between the foreground process and the OS background task. The foreground
/// side must treat its content as possibly stale or partially consumed.
///
/// Writes are atomic per key: a value is either fully visible or not at all,
/// even when the writing process is killed mid-write.
#[async_trait]
pub trait SharedStateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
