use crate::error::StorageError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Every accepted backend identifier, in display order.
pub const SUPPORTED_BACKENDS: [&str; 3] = ["memory", "sqlite", "bolt"];

/// Identifies one of the storage backends.
///
/// Parsing is case-sensitive. `"bolt"` selects the embedded key-value
/// store for compatibility with existing deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Process-local map, lost on restart.
    Memory,
    /// Single-file relational store.
    Sqlite,
    /// Single-file transactional key-value store.
    KeyValue,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Sqlite => "sqlite",
            BackendKind::KeyValue => "bolt",
        }
    }

    /// Whether records survive a process restart.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, BackendKind::Memory)
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            "bolt" => Ok(BackendKind::KeyValue),
            other => Err(StorageError::UnsupportedBackend {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
