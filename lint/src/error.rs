//! Error types for declaration loading and checking.
//!
//! Provides a unified error type covering I/O, JSON and YAML parsing, input
//! path problems, and declaration-time schema errors reported by the core
//! crate.

use json_mapper_core::{CatalogError, DeclarationError};
use thiserror::Error;

/// Errors that can occur while loading or checking declarations.
#[derive(Debug, Error)]
pub enum LintError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A path argument does not exist or cannot be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File extension is not one of `.json`, `.yml`, `.yaml`.
    #[error("unsupported declaration format: {0}")]
    UnsupportedFormat(String),

    /// A schema declaration is structurally invalid.
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Declared schemas could not be assembled into a catalog.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A function rule names a converter that was never registered.
    #[error("unknown converter: {0}")]
    UnknownConverter(String),

    /// An `extends` names a schema that is not declared (or, when building a
    /// catalog, not declared earlier in the file).
    #[error("`{schema}` extends unknown schema `{parent}`")]
    UnknownParent { schema: String, parent: String },

    /// An `extends` chain loops back on itself.
    #[error("inheritance cycle through `{0}`")]
    CyclicInheritance(String),

    /// A field that must be initialized declares no default value.
    #[error("`{schema}.{field}` has no default value")]
    MissingDefault { schema: String, field: String },
}

/// Convenience alias for results with [`LintError`].
pub type Result<T> = std::result::Result<T, LintError>;
