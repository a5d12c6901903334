//! Declaration-time errors.
//!
//! Decoding itself never fails on bad data; these errors surface only while
//! schemas are being declared or assembled into a
//! [`SchemaCatalog`](crate::SchemaCatalog), and when a caller asks the
//! catalog for a schema it does not hold.

use thiserror::Error;

/// Errors raised while declaring a single schema.
///
/// Each variant describes a structural problem in the field-descriptor
/// table. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// Schema name is empty or whitespace-only.
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    /// Field name is empty or whitespace-only.
    #[error("field name cannot be empty in schema `{0}`")]
    EmptyFieldName(String),
    /// Two fields in the same schema share a name.
    #[error("duplicate field `{schema}.{field}`")]
    DuplicateField { schema: String, field: String },
    /// A rule or flag targets a field the schema does not declare.
    #[error("`{schema}.{field}` is not a declared field")]
    UnknownField { schema: String, field: String },
    /// A second custom rule was registered on the same field.
    #[error("`{schema}.{field}` already has a custom mapper; it must be registered only once")]
    DuplicateMapper { schema: String, field: String },
}

/// Errors raised while assembling or querying a [`SchemaCatalog`](crate::SchemaCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two schemas in the same catalog share a name.
    #[error("duplicate schema in catalog: {0}")]
    DuplicateSchema(String),
    /// A nested-schema rule points at a schema the catalog does not hold.
    #[error("`{schema}.{field}` maps through unknown schema `{target}`")]
    UnresolvedReference {
        schema: String,
        field: String,
        target: String,
    },
    /// The requested schema is not in the catalog.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),
}
