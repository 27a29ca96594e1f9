//! Error types for reference slots

use thiserror::Error;

/// Result type alias using RefError
pub type Result<T> = std::result::Result<T, RefError>;

/// Errors raised by reference slot bookkeeping.
///
/// Catalog staleness is never an error; it is healed on read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    /// No reference slot is registered under this attribute
    #[error("Reference slot not found: {0}")]
    UnknownSlot(String),

    /// A reference slot is already registered under this attribute
    #[error("Reference slot already registered: {0}")]
    DuplicateSlot(String),
}
