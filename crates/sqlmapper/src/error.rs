//! Error types for sqlmapper

use thiserror::Error;

/// Result type alias for sqlmapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors raised while resolving metadata or generating statements.
///
/// All of these are configuration or programming errors. None of them is
/// transient, so callers should not retry.
#[derive(Debug, Clone, Error)]
pub enum MapperError {
    /// A column token was blank or could not be resolved
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// A statement was built without a table name
    #[error("Missing table name for {0}")]
    MissingTable(String),

    /// An UPDATE was built without any SET assignment
    #[error("UPDATE on {0} has no SET assignments")]
    EmptySet(String),

    /// An id-dependent operation was requested on an entity without id columns
    #[error("Entity '{entity}' declares no id columns")]
    MissingId { entity: String },

    /// Key values did not line up with the declared id columns
    #[error("Key arity mismatch: expected {expected} value(s), got {actual}")]
    KeyArity { expected: usize, actual: usize },

    /// An id field carried no value where one is required
    #[error("Id field '{field}' has no value")]
    MissingIdValue { field: String },

    /// A batch operation received no items
    #[error("Batch operation on {0} received no items")]
    EmptyBatch(String),

    /// The entity setter was called with a field it does not declare
    #[error("Entity '{entity}' has no field '{field}'")]
    UnknownField { entity: String, field: String },

    /// The configured dialect cannot express the requested statement
    #[error("Unsupported for {dialect}: {message}")]
    Unsupported { dialect: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Value conversion error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MapperError {
    /// Create an unknown column error
    pub fn unknown_column(token: impl Into<String>) -> Self {
        Self::UnknownColumn(token.into())
    }

    /// Create a missing id error for an entity
    pub fn missing_id(entity: impl Into<String>) -> Self {
        Self::MissingId {
            entity: entity.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Create an unsupported-dialect error
    pub fn unsupported(dialect: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect: dialect.to_string(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error came from an unresolved column token
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, Self::UnknownColumn(_))
    }

    /// Check if this error came from a missing id declaration
    pub fn is_missing_id(&self) -> bool {
        matches!(self, Self::MissingId { .. })
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
