use crate::backend::BackendKind;
use crate::error::Result;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A shortened URL as stored by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    /// Backend-assigned identifier. `0` until the link is first saved.
    pub id: u64,
    /// The original URL that was shortened.
    pub original: String,
    /// The short code, unique across all records.
    pub short: String,
    /// When the link was first persisted.
    pub created_at: Option<Timestamp>,
    /// Number of successful redirects.
    pub clicks: u64,
}

impl ShortLink {
    /// Creates an unsaved link with no clicks.
    pub fn new(original: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            id: 0,
            original: original.into(),
            short: short.into(),
            created_at: None,
            clicks: 0,
        }
    }

    /// Returns `true` once a backend has assigned an id.
    pub fn is_saved(&self) -> bool {
        self.id != 0
    }

    /// Ordering used by [`Repository::get_all`]: newest first, ties broken by
    /// descending id.
    pub fn newest_first(a: &ShortLink, b: &ShortLink) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// The storage contract every backend implements.
///
/// One instance is created at startup and shared by all request handlers
/// for the lifetime of the process.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// The backend behind this repository.
    fn kind(&self) -> BackendKind;

    /// Persists a new link and returns the stored record.
    ///
    /// Assigns `id` when it is `0` and `created_at` when it is unset.
    /// Returns `Err(DuplicateKey)` if the short code already exists, or if
    /// `id` is non-zero and already taken. Auto-assigned ids always exceed
    /// every id stored so far.
    async fn save(&self, link: ShortLink) -> Result<ShortLink>;

    /// Retrieves the link for an exact short code match.
    /// Returns `Err(NotFound)` if the code does not exist.
    async fn get(&self, short: &str) -> Result<ShortLink>;

    /// Atomically adds one click to the link.
    /// Returns `Err(NotFound)` if the code does not exist.
    async fn increment_clicks(&self, short: &str) -> Result<()>;

    /// Returns every stored link, newest first (see [`ShortLink::newest_first`]).
    async fn get_all(&self) -> Result<Vec<ShortLink>>;

    /// Releases the backend's resources. Called once at shutdown.
    async fn close(&self) -> Result<()>;
}
