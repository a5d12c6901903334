//! Per-field custom rules.
//!
//! A [`TemplateRegistry`] records, for each field of one schema, an optional
//! [`CustomMapper`] and an optional "ignore decode errors" flag. Every
//! [`SchemaDefinition`](crate::SchemaDefinition) owns its registry; it is
//! written while the schema is declared and only read afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeclarationError;

/// Error list reported by a conversion: `None` when nothing went wrong.
pub type Errors = Option<Vec<String>>;

/// Primitive conversion applied by [`CustomMapper::Coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    /// Returns the type name a field mapped through this kind should declare.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared conversion function from a raw value to `(value, errors)`.
#[derive(Clone)]
pub struct ConvertFn(Arc<dyn Fn(&Value) -> (Value, Errors) + Send + Sync>);

impl ConvertFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> (Value, Errors) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, raw: &Value) -> (Value, Errors) {
        (self.0)(raw)
    }
}

impl fmt::Debug for ConvertFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConvertFn(..)")
    }
}

/// A custom conversion rule attached to one field.
///
/// # Examples
///
/// ```
/// use json_mapper_core::{CustomMapper, PrimitiveKind};
/// use serde_json::{Value, json};
///
/// let as_text = CustomMapper::Coerce(PrimitiveKind::String);
/// let user = CustomMapper::nested("User");
/// let upper = CustomMapper::convert(|raw: &Value| match raw.as_str() {
///     Some(s) => (json!(s.to_uppercase()), None),
///     None => (Value::Null, Some(vec!["expected text".to_string()])),
/// });
///
/// assert!(matches!(as_text, CustomMapper::Coerce(PrimitiveKind::String)));
/// assert_eq!(user.nested_schema(), Some("User"));
/// assert!(upper.nested_schema().is_none());
/// ```
#[derive(Debug, Clone)]
pub enum CustomMapper {
    /// Primitive constructor conversion; never reports errors.
    Coerce(PrimitiveKind),
    /// Arbitrary fallible conversion.
    Convert(ConvertFn),
    /// Decode the value with another schema, looked up by name.
    Nested(String),
}

impl CustomMapper {
    /// Wraps a conversion closure.
    pub fn convert<F>(f: F) -> Self
    where
        F: Fn(&Value) -> (Value, Errors) + Send + Sync + 'static,
    {
        Self::Convert(ConvertFn::new(f))
    }

    /// References another schema by name.
    pub fn nested(schema: impl Into<String>) -> Self {
        Self::Nested(schema.into())
    }

    /// Name of the referenced schema for [`CustomMapper::Nested`].
    pub fn nested_schema(&self) -> Option<&str> {
        match self {
            Self::Nested(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FieldRules {
    mapper: Option<CustomMapper>,
    ignore_error: bool,
}

/// Custom rules of one schema, keyed by field name.
///
/// # Examples
///
/// ```
/// use json_mapper_core::{CustomMapper, DeclarationError, PrimitiveKind, TemplateRegistry};
///
/// let mut registry = TemplateRegistry::new("Test");
/// registry
///     .register_mapper("tags", CustomMapper::Coerce(PrimitiveKind::String))
///     .unwrap();
/// registry.register_ignore_error("legacy");
///
/// assert!(registry.mapper("tags").is_some());
/// assert!(registry.is_error_ignored("legacy"));
/// assert!(!registry.is_error_ignored("tags"));
///
/// // At most one rule per field
/// let err = registry
///     .register_mapper("tags", CustomMapper::Coerce(PrimitiveKind::Number))
///     .unwrap_err();
/// assert!(matches!(err, DeclarationError::DuplicateMapper { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    schema: String,
    rules: HashMap<String, FieldRules>,
}

impl TemplateRegistry {
    /// Creates an empty registry for the named schema.
    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            rules: HashMap::new(),
        }
    }

    /// Records the custom rule for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::DuplicateMapper`] if the field already has
    /// a rule; the existing rule is kept.
    pub fn register_mapper(
        &mut self,
        field: &str,
        rule: CustomMapper,
    ) -> Result<(), DeclarationError> {
        let rules = self.rules.entry(field.to_string()).or_default();
        if rules.mapper.is_some() {
            return Err(DeclarationError::DuplicateMapper {
                schema: self.schema.clone(),
                field: field.to_string(),
            });
        }
        rules.mapper = Some(rule);
        Ok(())
    }

    /// Marks decode failures on `field` as silently tolerated. Idempotent.
    pub fn register_ignore_error(&mut self, field: &str) {
        self.rules.entry(field.to_string()).or_default().ignore_error = true;
    }

    /// Returns the custom rule for `field`, if any.
    pub fn mapper(&self, field: &str) -> Option<&CustomMapper> {
        self.rules.get(field).and_then(|rules| rules.mapper.as_ref())
    }

    /// Returns `true` if decode errors on `field` are suppressed.
    pub fn is_error_ignored(&self, field: &str) -> bool {
        self.rules.get(field).is_some_and(|rules| rules.ignore_error)
    }

    /// Iterates over `(field, schema)` pairs for every nested-schema rule.
    pub fn nested_references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().filter_map(|(field, rules)| {
            rules
                .mapper
                .as_ref()
                .and_then(CustomMapper::nested_schema)
                .map(|target| (field.as_str(), target))
        })
    }

    /// Iterates over every field name that has a rule or flag.
    pub(crate) fn field_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
