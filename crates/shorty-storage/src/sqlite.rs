use async_trait::async_trait;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use shorty_core::{BackendKind, Repository, Result, ShortLink, StorageError};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Layout of `created_at`, matching SQLite's `CURRENT_TIMESTAMP` with
/// optional fractional seconds. Always UTC, so text order is time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original TEXT NOT NULL,
    short TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    clicks INTEGER NOT NULL DEFAULT 0
)
"#;

const CREATE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_urls_short ON urls(short)";

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of the repository contract.
///
/// Uniqueness of short codes is enforced by the schema, and clicks are
/// incremented by a single `UPDATE`, so concurrent redirects never lose a
/// count. `get_all` orders by `created_at DESC, id DESC`.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database file and its schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("cannot open '{}': {e}", path.display()))
            })?;

        let repository = Self::new(pool);
        repository.create_schema().await?;

        info!(path = %path.display(), "sqlite storage opened");
        Ok(repository)
    }

    /// Creates a repository from an existing pool. The schema must exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Unavailable(format!("cannot create schema: {e}")))?;
        }
        Ok(())
    }
}

fn format_created_at(timestamp: Timestamp) -> String {
    timestamp.strftime(TIMESTAMP_FORMAT).to_string()
}

fn parse_created_at(text: &str) -> Option<Timestamp> {
    DateTime::strptime(TIMESTAMP_FORMAT, text)
        .and_then(|datetime| datetime.to_zoned(TimeZone::UTC))
        .map(|zoned| zoned.timestamp())
        .ok()
}

fn to_i64(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Query(format!("{field} out of range for sqlite: {value}")))
}

fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("negative {field} in database: {value}")))
}

fn link_from_row(row: &SqliteRow) -> Result<ShortLink> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let original: String = row.try_get("original").map_err(map_sqlx_error)?;
    let short: String = row.try_get("short").map_err(map_sqlx_error)?;
    let created_at_raw: String = row.try_get("created_at").map_err(map_sqlx_error)?;
    let clicks: i64 = row.try_get("clicks").map_err(map_sqlx_error)?;

    let created_at = parse_created_at(&created_at_raw).unwrap_or_else(|| {
        warn!(
            short = %short,
            created_at = %created_at_raw,
            "unparseable created_at, substituting current time"
        );
        Timestamp::now()
    });

    Ok(ShortLink {
        id: to_u64(id, "id")?,
        original,
        short,
        created_at: Some(created_at),
        clicks: to_u64(clicks, "clicks")?,
    })
}

/// Which unique column an insert collided on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    Id,
    Short,
}

fn unique_conflict(err: &sqlx::Error) -> Option<Conflict> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }

    // SQLite names the column: "UNIQUE constraint failed: urls.id".
    if db_err.message().contains("urls.id") {
        Some(Conflict::Id)
    } else {
        Some(Conflict::Short)
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(message)
        }
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::Serialization(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn save(&self, mut link: ShortLink) -> Result<ShortLink> {
        let created_at = *link.created_at.get_or_insert_with(Timestamp::now);
        let id = if link.is_saved() {
            Some(to_i64(link.id, "id")?)
        } else {
            None
        };

        let result = sqlx::query(
            r#"
            INSERT INTO urls (id, original, short, created_at, clicks)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&link.original)
        .bind(&link.short)
        .bind(format_created_at(created_at))
        .bind(to_i64(link.clicks, "clicks")?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                link.id = to_u64(done.last_insert_rowid(), "id")?;
                Ok(link)
            }
            Err(err) => match unique_conflict(&err) {
                Some(Conflict::Id) => Err(StorageError::duplicate_id(link.id)),
                Some(Conflict::Short) => Err(StorageError::DuplicateKey(link.short)),
                None => Err(map_sqlx_error(err)),
            },
        }
    }

    async fn get(&self, short: &str) -> Result<ShortLink> {
        let row = sqlx::query(
            r#"
            SELECT id, original, short, created_at, clicks
            FROM urls
            WHERE short = ?
            "#,
        )
        .bind(short)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(short.to_string()));
        };

        link_from_row(&row)
    }

    async fn increment_clicks(&self, short: &str) -> Result<()> {
        let result = sqlx::query("UPDATE urls SET clicks = clicks + 1 WHERE short = ?")
            .bind(short)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(short.to_string()));
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ShortLink>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original, short, created_at, clicks
            FROM urls
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(link_from_row).collect()
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        info!("sqlite storage closed");
        Ok(())
    }
}
