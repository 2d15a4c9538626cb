use crate::application::ports::shared_state::SharedStateStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Shared key-value store backed by one file per namespaced key in a
/// directory both processes can reach. Writes go through a temp file and an
/// atomic rename, so a value is either fully visible or not at all even when
/// the writer is killed mid-write.
pub struct FileSharedState {
    dir: PathBuf,
    namespace: String,
}

impl FileSharedState {
    pub fn new(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            namespace: namespace.into(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.{}.json", self.namespace, sanitized))
    }

    async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }
}

async fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, value).await?;
    tokio::fs::rename(&tmp, path).await
}

#[async_trait]
impl SharedStateStore for FileSharedState {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.key_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.ensure_dir().await?;
        write_atomic(&self.key_path(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileSharedState {
        FileSharedState::new(dir.path(), "wayline")
    }

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.get("pending-snapshot").await.unwrap(), None);

        store.set("pending-snapshot", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("pending-snapshot").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("pending-snapshot").await.unwrap();
        assert_eq!(store.get("pending-snapshot").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_of_absent_key_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        store(&dir).remove("uploaded-ids").await.unwrap();
    }

    #[tokio::test]
    async fn set_overwrites_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.set("credential-snapshot", "first").await.unwrap();
        store.set("credential-snapshot", "second").await.unwrap();
        assert_eq!(
            store.get("credential-snapshot").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn namespaces_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let a = FileSharedState::new(dir.path(), "app-a");
        let b = FileSharedState::new(dir.path(), "app-b");

        a.set("uploaded-ids", "from-a").await.unwrap();
        assert_eq!(b.get("uploaded-ids").await.unwrap(), None);
    }
}
