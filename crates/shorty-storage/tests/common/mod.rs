use std::sync::Arc;

use shorty_storage::{InMemoryRepository, RedbRepository, Repository, SqliteRepository};
use tempfile::TempDir;

/// A repository plus whatever must stay alive for it to work.
pub struct Fixture {
    _dir: Option<TempDir>,
    pub repo: Arc<dyn Repository>,
}

impl Fixture {
    pub async fn memory() -> Self {
        Self {
            _dir: None,
            repo: Arc::new(InMemoryRepository::new()),
        }
    }

    pub async fn kv() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = RedbRepository::open(dir.path().join("urls.bolt.db")).expect("open redb");
        Self {
            _dir: Some(dir),
            repo: Arc::new(repo),
        }
    }

    pub async fn sqlite() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = SqliteRepository::open(dir.path().join("urls.db"))
            .await
            .expect("open sqlite");
        Self {
            _dir: Some(dir),
            repo: Arc::new(repo),
        }
    }
}
