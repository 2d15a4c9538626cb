use crate::application::ports::{
    LocationUpsert, RemoteStore, SharedStateStore, CREDENTIAL_SNAPSHOT_KEY, PENDING_SNAPSHOT_KEY,
    UPLOADED_IDS_KEY,
};
use crate::domain::entities::{CredentialSnapshot, PendingLocationRecord, UploadedIds};
use crate::domain::value_objects::CaptureTime;
use crate::shared::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How one background run ended. Everything here is a clean exit; the OS
/// scheduler must never see this task fail for recoverable reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No snapshot in the shared store; the expected common case.
    NoSnapshot,
    /// Snapshot present but no usable credential.
    NoCredential,
    /// Snapshot present but nothing in it survived validation.
    NothingToUpload,
    /// The batched write could not be submitted; everything left for retry.
    RemoteUnavailable,
    /// Some records failed; nothing was cleared.
    PartialFailure { uploaded: u32, failed: u32 },
    /// Full success: uploaded-ids written, snapshot cleared.
    Uploaded { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRunReport {
    pub examined: u32,
    pub skipped_invalid: u32,
    pub outcome: RunOutcome,
}

/// One isolated upload pass, run by the OS on its own schedule with no access
/// to the foreground process or its local database. Reads only the shared
/// snapshot, submits one batched write, and reports confirmed ids back
/// through the shared store.
pub struct BackgroundUploadTask {
    shared: Arc<dyn SharedStateStore>,
    remote: Arc<dyn RemoteStore>,
}

impl BackgroundUploadTask {
    pub fn new(shared: Arc<dyn SharedStateStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self { shared, remote }
    }

    /// Errors escape only for genuinely unexpected failures (the shared store
    /// itself misbehaving). Recoverable conditions all resolve to a report.
    pub async fn run_once(&self) -> Result<BackgroundRunReport, AppError> {
        let Some(raw_snapshot) = self.shared.get(PENDING_SNAPSHOT_KEY).await? else {
            debug!("No pending snapshot, background run is a no-op");
            return Ok(report(0, 0, RunOutcome::NoSnapshot));
        };

        let credential = match self.read_credential().await? {
            Some(credential) => credential,
            None => return Ok(report(0, 0, RunOutcome::NoCredential)),
        };

        let (records, examined, skipped) = parse_snapshot_records(&raw_snapshot);
        if records.is_empty() {
            // Nothing valid to send. The snapshot stays; the foreground queue
            // is the source of truth and its engine will retry.
            return Ok(report(examined, skipped, RunOutcome::NothingToUpload));
        }

        let now = Utc::now();
        let writes: Vec<LocationUpsert> = records
            .iter()
            .map(|record| LocationUpsert::from_record(record, now))
            .collect();

        // One request for the whole batch; radio wake time dominates the
        // execution quota.
        let outcome = match self.remote.commit_batch(&credential, &writes).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Batched write not submitted, leaving snapshot for retry");
                return Ok(report(examined, skipped, RunOutcome::RemoteUnavailable));
            }
        };

        if !outcome.fully_successful() {
            // Partial failure clears nothing; the next scheduled run or the
            // foreground engine picks everything up again.
            for (id, message) in &outcome.failed {
                warn!(id = %id, error = %message, "Record failed in batched write");
            }
            return Ok(report(
                examined,
                skipped,
                RunOutcome::PartialFailure {
                    uploaded: outcome.uploaded.len() as u32,
                    failed: outcome.failed.len() as u32,
                },
            ));
        }

        let uploaded = UploadedIds::new(outcome.uploaded);
        let count = uploaded.ids.len() as u32;
        self.shared
            .set(UPLOADED_IDS_KEY, &serde_json::to_string(&uploaded)?)
            .await?;
        self.shared.remove(PENDING_SNAPSHOT_KEY).await?;
        // The credential was minted for this one cycle.
        self.shared.remove(CREDENTIAL_SNAPSHOT_KEY).await?;

        info!(count, "Background batch uploaded");
        Ok(report(examined, skipped, RunOutcome::Uploaded { count }))
    }

    async fn read_credential(&self) -> Result<Option<CredentialSnapshot>, AppError> {
        let Some(raw) = self.shared.get(CREDENTIAL_SNAPSHOT_KEY).await? else {
            debug!("No credential snapshot, background run is a no-op");
            return Ok(None);
        };

        match serde_json::from_str::<CredentialSnapshot>(&raw) {
            Ok(credential) if credential.is_usable() => Ok(Some(credential)),
            Ok(_) => {
                debug!("Credential snapshot unusable, background run is a no-op");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Credential snapshot unreadable, background run is a no-op");
                Ok(None)
            }
        }
    }
}

/// Pulls individually valid records out of the snapshot JSON. A record that
/// fails to parse or carries an invalid timestamp is skipped and logged, never
/// discarded from the local queue and never fatal to the batch.
fn parse_snapshot_records(raw: &str) -> (Vec<PendingLocationRecord>, u32, u32) {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Pending snapshot unreadable, skipping run");
            return (Vec::new(), 0, 0);
        }
    };

    let entries = match value.get("locations").and_then(|v| v.as_array()) {
        Some(entries) => entries.clone(),
        None => {
            warn!("Pending snapshot has no locations array, skipping run");
            return (Vec::new(), 0, 0);
        }
    };

    let examined = entries.len() as u32;
    let mut records = Vec::new();
    let mut skipped = 0;

    for entry in entries {
        match serde_json::from_value::<PendingLocationRecord>(entry) {
            Ok(record) => {
                if let Err(e) = CaptureTime::validate(record.captured_at.as_datetime()) {
                    warn!(id = %record.id, error = %e, "Skipping record with invalid timestamp");
                    skipped += 1;
                    continue;
                }
                records.push(record);
            }
            Err(e) => {
                warn!(error = %e, "Skipping unparseable snapshot record");
                skipped += 1;
            }
        }
    }

    (records, examined, skipped)
}

fn report(examined: u32, skipped_invalid: u32, outcome: RunOutcome) -> BackgroundRunReport {
    BackgroundRunReport {
        examined,
        skipped_invalid,
        outcome,
    }
}
