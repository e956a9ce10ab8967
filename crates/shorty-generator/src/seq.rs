use crate::Generator;
use std::sync::atomic::{AtomicU64, Ordering};

/// A predictable generator using a sequential counter.
///
/// Produces codes like "sy000000", "sy000001", etc. Handy in tests where
/// the next code must be known in advance.
#[derive(Debug)]
pub struct SequenceGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SequenceGenerator {
    /// Creates a generator starting at zero.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a generator starting from a specific counter value.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl Generator for SequenceGenerator {
    fn generate(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{:06}", self.prefix, count)
    }
}
