//! Core types and traits for the shorty URL shortener.
//!
//! This crate provides the record model, the storage contract and the
//! error type shared by every storage backend and by the gateway.

pub mod backend;
pub mod error;
pub mod repository;

pub use backend::{BackendKind, SUPPORTED_BACKENDS};
pub use error::{Result, StorageError};
pub use repository::{Repository, ShortLink};
