//! Error types for Trellis

use thiserror::Error;

/// The main error type for Trellis operations
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("Malformed attribute string '{input}': {reason}")]
    MalformedAttributeString { input: String, reason: String },

    #[error("Duplicate schema: {0} is already registered")]
    DuplicateSchema(String),

    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Invalid value '{value}' for type {expected}: {reason}")]
    InvalidValueForType {
        value: String,
        expected: String,
        reason: String,
    },

    #[error("Invalid schema definition: {0}")]
    InvalidSchema(String),

    #[error("Duplicate primitive: {0} is already registered")]
    DuplicatePrimitive(String),

    #[error("Primitive not found: {0}")]
    PrimitiveNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

impl TrellisError {
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        TrellisError::MalformedAttributeString {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(value: &str, expected: &str, reason: impl Into<String>) -> Self {
        TrellisError::InvalidValueForType {
            value: value.to_string(),
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;

impl From<toml::de::Error> for TrellisError {
    fn from(err: toml::de::Error) -> Self {
        TrellisError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for TrellisError {
    fn from(err: toml::ser::Error) -> Self {
        TrellisError::TomlSerError(err.to_string())
    }
}
