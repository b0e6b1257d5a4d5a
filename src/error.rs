//! Error types for the event schema model

use thiserror::Error;

use crate::value::ScalarKind;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Event schema errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Argument '{0}' must not be empty")]
    EmptyArgument(&'static str),

    #[error("Invalid version format: '{0}'")]
    InvalidVersionFormat(String),

    #[error("'{0}' is neither a version nor an absolute schema location")]
    InvalidSchemaLocation(String),

    #[error("Invalid constraint configuration: {0}")]
    InvalidConstraintConfiguration(String),

    #[error("A property named '{0}' already exists in the collection")]
    DuplicatePropertyName(String),

    #[error("The property '{0}' does not exist in the collection")]
    PropertyNotFound(String),

    #[error("Property '{name}' version {version} is not compatible with owner version {owner}")]
    IncompatibleVersion {
        name: String,
        version: String,
        owner: String,
    },

    #[error("A constraint of kind {0} already exists in the collection")]
    DuplicateConstraintKind(String),

    #[error("Index {index} is out of bounds for a collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("The type '{0}' is not an event data type")]
    NotAnEventType(String),

    #[error("Range bounds of member '{member}' are not compatible with its type '{data_type}'")]
    IncompatibleRangeBounds { member: String, data_type: String },

    #[error("The data type '{0}' is not supported for value encoding")]
    UnsupportedDataType(ScalarKind),

    #[error("A non-finite {0} value cannot be encoded as a JSON number")]
    NonFiniteValue(ScalarKind),

    #[error("Schema write was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
