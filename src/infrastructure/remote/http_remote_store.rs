use crate::application::ports::{
    AuthProvider, BatchOutcome, LocationUpsert, PhotoMetadataUpsert, RemoteStore,
};
use crate::domain::entities::CredentialSnapshot;
use crate::domain::value_objects::RecordId;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How long a minted token is reused before asking for a fresh one. Well
/// under typical token lifetimes, so a full sync cycle costs one mint.
const CREDENTIAL_REUSE_SECONDS: i64 = 240;

#[derive(Debug, Deserialize)]
struct BatchResponse {
    results: Vec<BatchResult>,
}

#[derive(Debug, Deserialize)]
struct BatchResult {
    id: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Remote store client over the backend's REST write API. Single-record
/// upserts are PATCH merges keyed by the record id; the background path posts
/// all writes as one batched request.
pub struct HttpRemoteStore {
    config: RemoteConfig,
    http: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
    credential: RwLock<Option<CredentialSnapshot>>,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self {
            config,
            http,
            auth,
            credential: RwLock::new(None),
        })
    }

    /// Reuses the last minted token while it is still fresh, so one sync
    /// cycle over many records costs a single token-endpoint round trip.
    async fn current_credential(&self) -> Result<CredentialSnapshot, AppError> {
        {
            let cached = self.credential.read().await;
            if let Some(credential) = cached.as_ref() {
                let age = (Utc::now() - credential.minted_at).num_seconds();
                if age < CREDENTIAL_REUSE_SECONDS {
                    return Ok(credential.clone());
                }
            }
        }

        let minted = self.auth.mint_access_token().await?;
        *self.credential.write().await = Some(minted.clone());
        Ok(minted)
    }

    async fn forget_credential(&self) {
        *self.credential.write().await = None;
    }

    fn status_error(status: StatusCode, body: String) -> AppError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            AppError::Auth(format!("Remote rejected credential: {status}"))
        } else {
            AppError::Network(format!("Remote write failed: {status} {body}"))
        }
    }

    async fn patch_merge<T: serde::Serialize>(
        &self,
        collection: &str,
        id: &RecordId,
        payload: &T,
    ) -> Result<(), AppError> {
        let credential = self.current_credential().await?;
        let url = format!("{}/{collection}/{id}", self.config.base_url);

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&credential.access_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                // The cached token is no good; the next attempt mints fresh.
                self.forget_credential().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upsert_location(&self, upsert: &LocationUpsert) -> Result<(), AppError> {
        self.patch_merge("locations", &upsert.id, upsert).await
    }

    async fn upsert_photo_metadata(&self, upsert: &PhotoMetadataUpsert) -> Result<(), AppError> {
        self.patch_merge("photos", &upsert.id, upsert).await
    }

    async fn commit_batch(
        &self,
        credential: &CredentialSnapshot,
        writes: &[LocationUpsert],
    ) -> Result<BatchOutcome, AppError> {
        let url = format!("{}/locations:batchUpsert", credential.remote_base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credential.access_token)
            .json(&serde_json::json!({ "writes": writes }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }

        let parsed: BatchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("Unreadable batch response: {e}")))?;

        let mut outcome = BatchOutcome::default();
        for result in parsed.results {
            let id = RecordId::parse(&result.id)
                .map_err(|e| AppError::Network(format!("Batch response id: {e}")))?;
            if result.status == "ok" {
                outcome.uploaded.push(id);
            } else {
                outcome
                    .failed
                    .push((id, result.message.unwrap_or(result.status)));
            }
        }
        Ok(outcome)
    }
}
