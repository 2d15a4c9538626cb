use crate::application::ports::AuthProvider;
use crate::domain::entities::CredentialSnapshot;
use crate::domain::value_objects::OwnerId;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Auth collaborator backed by the backend's token endpoint. Holds the owner
/// identity and a session refresh token; every mint is a fresh short-lived
/// access token, never cached across handoff cycles.
pub struct TokenAuthProvider {
    config: RemoteConfig,
    http: reqwest::Client,
    owner_id: OwnerId,
    refresh_token: String,
}

impl TokenAuthProvider {
    pub fn new(
        config: RemoteConfig,
        owner_id: OwnerId,
        refresh_token: String,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self {
            config,
            http,
            owner_id,
            refresh_token,
        })
    }
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn current_owner(&self) -> Result<OwnerId, AppError> {
        Ok(self.owner_id.clone())
    }

    async fn mint_access_token(&self) -> Result<CredentialSnapshot, AppError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": self.refresh_token,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Auth(format!("Token mint failed: {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Unreadable token response: {e}")))?;

        Ok(CredentialSnapshot {
            access_token: token.access_token,
            owner_id: self.owner_id.clone(),
            remote_base_url: self.config.base_url.clone(),
            minted_at: Utc::now(),
        })
    }
}

/// Fixed owner and token, used by the background binary (which receives its
/// credential through the handoff, not from this provider) and by tests.
pub struct StaticAuthProvider {
    credential: CredentialSnapshot,
}

impl StaticAuthProvider {
    pub fn new(credential: CredentialSnapshot) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_owner(&self) -> Result<OwnerId, AppError> {
        Ok(self.credential.owner_id.clone())
    }

    async fn mint_access_token(&self) -> Result<CredentialSnapshot, AppError> {
        Ok(self.credential.clone())
    }
}
