use serde::{Deserialize, Serialize};

/// Where a pending photo sits in the promotion pipeline: captured but not
/// archived, archived locally but not mirrored remotely, or fully synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    Pending,
    Promoted,
    Synced,
    Unknown(String),
}

impl RecordState {
    pub fn as_str(&self) -> &str {
        match self {
            RecordState::Pending => "pending",
            RecordState::Promoted => "promoted",
            RecordState::Synced => "synced",
            RecordState::Unknown(value) => value.as_str(),
        }
    }
}

impl From<&str> for RecordState {
    fn from(value: &str) -> Self {
        match value {
            "pending" => RecordState::Pending,
            "promoted" => RecordState::Promoted,
            "synced" => RecordState::Synced,
            other => RecordState::Unknown(other.to_string()),
        }
    }
}
