use crate::domain::entities::CredentialSnapshot;
use crate::domain::value_objects::OwnerId;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Authentication collaborator: current owner identity plus on-demand minting
/// of a short-lived access token. The core never holds long-lived credentials.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_owner(&self) -> Result<OwnerId, AppError>;

    /// Mints a fresh token for one handoff cycle. Implementations apply a
    /// hard timeout; an expired or unattainable token is an `Auth` error the
    /// caller downgrades to a no-op.
    async fn mint_access_token(&self) -> Result<CredentialSnapshot, AppError>;
}
