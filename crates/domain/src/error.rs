//! Domain error types

use thiserror::Error;

/// Domain-level errors raised while validating input or parsing values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required form field was empty.
    #[error("{field} is required")]
    MissingField {
        /// Name of the field as shown to the user.
        field: &'static str,
    },

    /// The email address is not shaped like one.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A date could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The task status is not one the backend knows.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
