use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub handoff: HandoffConfig,
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub file: PathBuf,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub token_url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    pub snapshot_interval: u64,
    pub shared_dir: PathBuf,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub position_timeout: u64,
    pub credential_timeout: u64,
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,
    pub overflow_limit: usize,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("wayline")
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            database: DatabaseConfig {
                file: data_dir.join("wayline.db"),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "https://api.wayline.app/v1".to_string(),
                token_url: "https://api.wayline.app/v1/auth/token".to_string(),
                request_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 60,
            },
            handoff: HandoffConfig {
                // Tens of seconds: the snapshot only has to be recent enough
                // for the next background run.
                snapshot_interval: 30,
                shared_dir: data_dir.join("shared"),
                namespace: "wayline".to_string(),
            },
            storage: StorageConfig { data_dir },
            capture: CaptureConfig {
                position_timeout: 10,
                credential_timeout: 15,
                max_image_dimension: 2048,
                jpeg_quality: 80,
                overflow_limit: 256,
            },
        }
    }
}
