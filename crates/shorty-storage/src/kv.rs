use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use shorty_core::{BackendKind, Repository, Result, ShortLink, StorageError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Short code -> JSON-encoded [`ShortLink`].
const LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("urls");

/// Id -> short code, so explicit ids can be checked for reuse.
const IDS: TableDefinition<u64, &str> = TableDefinition::new("url_ids");

/// Per-table id sequences, keyed by table name.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const LINKS_SEQUENCE: &str = "urls";

/// Embedded key-value implementation of the repository contract.
///
/// All records live in one redb file. Every mutation runs in its own write
/// transaction; redb admits a single writer at a time, which is what keeps
/// click increments from losing updates. Readers use snapshot transactions
/// and never block writers.
///
/// redb is synchronous, so each transaction runs on the blocking pool.
pub struct RedbRepository {
    path: PathBuf,
    db: RwLock<Option<Arc<Database>>>,
}

impl std::fmt::Debug for RedbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRepository")
            .field("path", &self.path)
            .field("open", &self.db.read().is_some())
            .finish()
    }
}

impl RedbRepository {
    /// Opens (creating if needed) the database file and its tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(|e| {
            StorageError::Unavailable(format!("cannot open '{}': {e}", path.display()))
        })?;

        create_tables(&db)
            .map_err(|e| StorageError::Unavailable(format!("cannot create tables: {e}")))?;

        info!(path = %path.display(), "key-value storage opened");
        Ok(Self {
            path,
            db: RwLock::new(Some(Arc::new(db))),
        })
    }

    fn handle(&self) -> Result<Arc<Database>> {
        self.db
            .read()
            .clone()
            .ok_or_else(|| StorageError::Unavailable("key-value store is closed".to_string()))
    }

    /// Runs `op` against the database on the blocking thread pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.handle()?;
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Unavailable(format!("key-value task failed: {e}")))?
    }
}

fn create_tables(db: &Database) -> std::result::Result<(), redb::Error> {
    let txn = db.begin_write()?;
    txn.open_table(LINKS)?;
    txn.open_table(IDS)?;
    txn.open_table(SEQUENCES)?;
    txn.commit()?;
    Ok(())
}

fn encode(link: &ShortLink) -> Result<Vec<u8>> {
    serde_json::to_vec(link).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode(short: &str, bytes: &[u8]) -> Result<ShortLink> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::Serialization(format!("record '{short}': {e}")))
}

fn map_redb_error(err: impl Into<redb::Error>) -> StorageError {
    let err: redb::Error = err.into();
    let message = err.to_string();

    match err {
        redb::Error::Corrupted(_) => StorageError::Serialization(message),
        redb::Error::DatabaseAlreadyOpen | redb::Error::Io(_) => StorageError::Unavailable(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for RedbRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn save(&self, mut link: ShortLink) -> Result<ShortLink> {
        link.created_at.get_or_insert_with(Timestamp::now);

        self.run(move |db| {
            let txn = db.begin_write().map_err(map_redb_error)?;
            {
                let mut links = txn.open_table(LINKS).map_err(map_redb_error)?;
                if links
                    .get(link.short.as_str())
                    .map_err(map_redb_error)?
                    .is_some()
                {
                    return Err(StorageError::DuplicateKey(link.short));
                }

                let mut ids = txn.open_table(IDS).map_err(map_redb_error)?;
                let mut sequences = txn.open_table(SEQUENCES).map_err(map_redb_error)?;
                let last = sequences
                    .get(LINKS_SEQUENCE)
                    .map_err(map_redb_error)?
                    .map(|guard| guard.value())
                    .unwrap_or(0);

                if !link.is_saved() {
                    link.id = last + 1;
                } else if ids.get(link.id).map_err(map_redb_error)?.is_some() {
                    return Err(StorageError::duplicate_id(link.id));
                }

                sequences
                    .insert(LINKS_SEQUENCE, last.max(link.id))
                    .map_err(map_redb_error)?;
                ids.insert(link.id, link.short.as_str())
                    .map_err(map_redb_error)?;

                let value = encode(&link)?;
                links
                    .insert(link.short.as_str(), value.as_slice())
                    .map_err(map_redb_error)?;
            }
            txn.commit().map_err(map_redb_error)?;
            Ok(link)
        })
        .await
    }

    async fn get(&self, short: &str) -> Result<ShortLink> {
        let short = short.to_string();
        self.run(move |db| {
            let txn = db.begin_read().map_err(map_redb_error)?;
            let links = txn.open_table(LINKS).map_err(map_redb_error)?;

            let Some(value) = links.get(short.as_str()).map_err(map_redb_error)? else {
                return Err(StorageError::NotFound(short));
            };
            decode(&short, value.value())
        })
        .await
    }

    async fn increment_clicks(&self, short: &str) -> Result<()> {
        let short = short.to_string();
        self.run(move |db| {
            let txn = db.begin_write().map_err(map_redb_error)?;
            {
                let mut links = txn.open_table(LINKS).map_err(map_redb_error)?;

                let current = links
                    .get(short.as_str())
                    .map_err(map_redb_error)?
                    .map(|guard| guard.value().to_vec());
                let Some(current) = current else {
                    return Err(StorageError::NotFound(short));
                };

                let mut link = decode(&short, &current)?;
                link.clicks += 1;

                let value = encode(&link)?;
                links
                    .insert(short.as_str(), value.as_slice())
                    .map_err(map_redb_error)?;
            }
            txn.commit().map_err(map_redb_error)
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        let mut all = self
            .run(|db| {
                let txn = db.begin_read().map_err(map_redb_error)?;
                let links = txn.open_table(LINKS).map_err(map_redb_error)?;

                let mut all = Vec::new();
                for entry in links.iter().map_err(map_redb_error)? {
                    let (key, value) = entry.map_err(map_redb_error)?;
                    all.push(decode(key.value(), value.value())?);
                }
                Ok(all)
            })
            .await?;

        all.sort_by(ShortLink::newest_first);
        Ok(all)
    }

    /// Detaches the database. In-flight operations finish on their own
    /// handle; the file is released once the last one completes.
    async fn close(&self) -> Result<()> {
        if self.db.write().take().is_some() {
            info!(path = %self.path.display(), "key-value storage closed");
        }
        Ok(())
    }
}
