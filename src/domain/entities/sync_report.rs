use serde::{Deserialize, Serialize};

/// Phase of the foreground sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Reading,
    Uploading,
    Reconciling,
}

/// Diagnostics surfaced to the UI layer: pending/synced counts and the last
/// sync error as a plain message, not a structured taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub is_syncing: bool,
    pub phase: SyncPhase,
    pub pending_locations: u64,
    pub pending_photos: u64,
    pub synced_locations: u64,
    pub synced_photos: u64,
    pub last_sync: Option<i64>,
    pub last_error: Option<String>,
}
