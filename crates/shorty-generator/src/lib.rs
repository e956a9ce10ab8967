//! Short code generators.
//!
//! Generators are pure: they never look at storage. Collisions are detected
//! by the repository on save and handled by the caller.

pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SequenceGenerator;

use thiserror::Error;

/// Shortest code a generator may be configured to produce.
pub const MIN_LENGTH: usize = 4;
/// Longest code a generator may be configured to produce.
pub const MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("code length must be between {min} and {max}, got {0}", min = MIN_LENGTH, max = MAX_LENGTH)]
    InvalidLength(usize),
}

/// Trait for generating short codes.
///
/// Implementations can vary from simple random generators to
/// sequential counters used in tests.
pub trait Generator: Send + Sync + 'static {
    /// Produces a candidate short code. Uniqueness is not guaranteed.
    fn generate(&self) -> String;
}
