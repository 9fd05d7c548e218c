//! Error types for pageindex.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pageindex.
///
/// Duplicate keys and missing keys are ordinary outcomes of `insert`,
/// `remove` and `search` and never show up here. This enum only covers
/// misuse and failures outside the tree itself.
#[derive(Debug, Error)]
pub enum Error {
    /// The tree was configured with an order below the minimum.
    #[error("Invalid B-tree order: {0} (must be at least 1)")]
    InvalidOrder(usize),

    /// Writing a structural dump to its sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `verify()` found a structural invariant that does not hold.
    ///
    /// This indicates a bug in the tree algorithms.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
