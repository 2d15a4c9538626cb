use crate::domain::entities::PendingLocationRecord;
use crate::domain::value_objects::{OwnerId, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wholesale serialization of the pending queue, written into the shared
/// key-value store for the background execution context. Overwritten each
/// time; correctness only depends on it being recent enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub owner_id: OwnerId,
    pub locations: Vec<PendingLocationRecord>,
    pub written_at: DateTime<Utc>,
}

impl PendingSnapshot {
    pub fn new(owner_id: OwnerId, locations: Vec<PendingLocationRecord>) -> Self {
        Self {
            owner_id,
            locations,
            written_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Short-lived access token plus connection parameters, minted fresh before
/// every snapshot write. The background context cannot refresh credentials
/// itself, so nothing here is cached beyond one handoff cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSnapshot {
    pub access_token: String,
    pub owner_id: OwnerId,
    pub remote_base_url: String,
    pub minted_at: DateTime<Utc>,
}

impl CredentialSnapshot {
    pub fn is_usable(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

/// Record ids a background run confirmed uploaded, left in the shared store
/// for the foreground reconciliation step to consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedIds {
    pub ids: Vec<RecordId>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl UploadedIds {
    pub fn new(ids: Vec<RecordId>) -> Self {
        Self {
            ids,
            uploaded_at: Some(Utc::now()),
        }
    }
}
