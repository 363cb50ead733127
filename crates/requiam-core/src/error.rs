//! Error Types

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An identifier was empty or whitespace only.
    #[error("{id_type} must not be empty")]
    EmptyIdentifier {
        /// The kind of identifier that was rejected
        id_type: &'static str,
    },
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
