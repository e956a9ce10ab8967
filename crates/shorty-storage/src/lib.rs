//! Storage backends for the shorty URL shortener.
//!
//! Three interchangeable implementations of [`Repository`]: a process-local
//! map, a single-file key-value store (redb) and a single-file relational
//! store (SQLite). [`open`] picks one from a configuration string.

pub mod kv;
pub mod memory;
pub mod selector;
pub mod sqlite;

pub use kv::RedbRepository;
pub use memory::InMemoryRepository;
pub use selector::{open, open_kind, StorageOptions, DEFAULT_KV_FILE, DEFAULT_SQLITE_FILE};
pub use shorty_core::{BackendKind, Repository, ShortLink, StorageError};
pub use sqlite::SqliteRepository;
