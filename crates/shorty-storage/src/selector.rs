use crate::{InMemoryRepository, RedbRepository, SqliteRepository};
use shorty_core::{BackendKind, Repository, Result, StorageError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use typed_builder::TypedBuilder;

/// File name of the relational database inside the data directory.
pub const DEFAULT_SQLITE_FILE: &str = "urls.db";

/// File name of the key-value database inside the data directory.
pub const DEFAULT_KV_FILE: &str = "urls.bolt.db";

/// Where the persistent backends keep their files.
#[derive(Debug, Clone, TypedBuilder)]
pub struct StorageOptions {
    #[builder(default = PathBuf::from("."), setter(into))]
    data_dir: PathBuf,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StorageOptions {
    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_SQLITE_FILE)
    }

    pub fn kv_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_KV_FILE)
    }
}

/// Opens the backend named by `backend` (`"memory"`, `"sqlite"` or `"bolt"`).
///
/// Meant to be called once at startup; any error is fatal.
pub async fn open(backend: &str, options: &StorageOptions) -> Result<Arc<dyn Repository>> {
    let kind: BackendKind = backend.parse()?;
    open_kind(kind, options).await
}

/// Opens the backend for an already-parsed [`BackendKind`].
pub async fn open_kind(kind: BackendKind, options: &StorageOptions) -> Result<Arc<dyn Repository>> {
    if kind.is_persistent() {
        tokio::fs::create_dir_all(options.data_dir())
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!(
                    "cannot create data directory '{}': {e}",
                    options.data_dir().display()
                ))
            })?;
    }

    let repository: Arc<dyn Repository> = match kind {
        BackendKind::Memory => Arc::new(InMemoryRepository::new()),
        BackendKind::Sqlite => Arc::new(SqliteRepository::open(options.sqlite_path()).await?),
        BackendKind::KeyValue => Arc::new(RedbRepository::open(options.kv_path())?),
    };

    info!(backend = %kind, "storage backend ready");
    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let err = open("unknown", &StorageOptions::default())
            .await
            .err()
            .unwrap();

        assert_eq!(
            err,
            StorageError::UnsupportedBackend {
                value: "unknown".to_string()
            }
        );
        assert!(err.to_string().contains("'unknown'"));
    }

    #[tokio::test]
    async fn each_identifier_selects_its_backend() {
        let dir = TempDir::new().unwrap();
        let options = StorageOptions::builder().data_dir(dir.path()).build();

        for (value, kind) in [
            ("memory", BackendKind::Memory),
            ("sqlite", BackendKind::Sqlite),
            ("bolt", BackendKind::KeyValue),
        ] {
            let repository = open(value, &options).await.unwrap();
            assert_eq!(repository.kind(), kind);
            repository.close().await.unwrap();
        }

        assert!(options.sqlite_path().exists());
        assert!(options.kv_path().exists());
    }

    #[tokio::test]
    async fn persistent_backends_create_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("data");
        let options = StorageOptions::builder().data_dir(&nested).build();

        let repository = open("bolt", &options).await.unwrap();
        repository.close().await.unwrap();

        assert!(nested.join(DEFAULT_KV_FILE).exists());
    }

    #[test]
    fn default_paths_live_in_working_directory() {
        let options = StorageOptions::default();

        assert_eq!(options.sqlite_path(), PathBuf::from("./urls.db"));
        assert_eq!(options.kv_path(), PathBuf::from("./urls.bolt.db"));
    }
}
