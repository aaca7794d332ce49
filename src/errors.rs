//! Centralized error handling.
//!
//! Provides a unified error type for the whole crate, a `Result` alias
//! and small conversion helpers.

use thiserror::Error;

use crate::schema::ValidationErrors;

/// Crate error types
#[derive(Error, Debug)]
pub enum Error {
    /// A lookup matched no row.
    #[error("Resource not found")]
    NotFound,

    /// Schema validation rejected the supplied values.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A schema, loader registry or managed entity was used inconsistently.
    #[error("Schema misuse: {0}")]
    Schema(String),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Convenience constructor for schema misuse errors
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for Option -> Error conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> Result<T> {
        self.ok_or(Error::NotFound)
    }
}
