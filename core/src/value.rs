//! Decoded values and schema instances.
//!
//! An [`Instance`] is the populated shape of a
//! [`SchemaDefinition`](crate::SchemaDefinition): one [`FieldValue`] per
//! declared field, kept in declaration order. Instances remember the name of
//! the schema that produced them so registry lookups can be made from an
//! instance alone.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::naming::to_snake_case;

/// Type category inferred from a field's default value.
///
/// Selects the coercion strategy during decoding. Computed once when the
/// field is declared.
///
/// # Examples
///
/// ```
/// use json_mapper_core::{ExpectedType, FieldValue};
///
/// assert_eq!(FieldValue::from("").expected_type(), ExpectedType::String);
/// assert_eq!(FieldValue::from(-1).expected_type(), ExpectedType::Number);
/// assert_eq!(FieldValue::null().expected_type(), ExpectedType::Null);
/// assert_eq!(ExpectedType::Boolean.to_string(), "boolean");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpectedType {
    Null,
    Array,
    String,
    Number,
    Boolean,
    /// Nested instances, objects and anything else; only decodable through
    /// a custom mapper.
    Unknown,
}

impl ExpectedType {
    /// Returns the name used in type-mismatch messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field's default or decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON: primitives, `null`, arbitrary arrays and objects.
    Json(Value),
    /// A nested schema instance.
    Instance(Instance),
    /// Element-wise mapped array.
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// The JSON `null` value.
    pub fn null() -> Self {
        Self::Json(Value::Null)
    }

    /// An empty array.
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Infers the [`ExpectedType`] of a field whose default is `self`.
    pub fn expected_type(&self) -> ExpectedType {
        match self {
            Self::Json(Value::Null) => ExpectedType::Null,
            Self::Json(Value::Array(_)) | Self::Array(_) => ExpectedType::Array,
            Self::Json(Value::String(_)) => ExpectedType::String,
            Self::Json(Value::Number(_)) => ExpectedType::Number,
            Self::Json(Value::Bool(_)) => ExpectedType::Boolean,
            Self::Json(Value::Object(_)) | Self::Instance(_) => ExpectedType::Unknown,
        }
    }

    /// Returns the plain JSON value, if this is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the nested instance, if this is one.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the mapped elements, if this is an element-wise mapped array.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Converts to JSON, keying nested instances by declared field names.
    pub fn to_json(&self) -> Value {
        self.render(false)
    }

    /// Converts to JSON, keying nested instances by snake_case wire keys.
    pub fn to_wire_json(&self) -> Value {
        self.render(true)
    }

    fn render(&self, wire: bool) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Instance(instance) => instance.render(wire),
            Self::Array(items) => Value::Array(items.iter().map(|item| item.render(wire)).collect()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<Instance> for FieldValue {
    fn from(value: Instance) -> Self {
        Self::Instance(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::Array(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Instance(instance) => instance.serialize(serializer),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A populated schema instance.
///
/// Created fresh by [`SchemaDefinition::instantiate`](crate::SchemaDefinition::instantiate)
/// and by every decode call; never shared between calls.
///
/// Serializes as an object keyed by declared field names, in declaration
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    schema: String,
    fields: Vec<(String, FieldValue)>,
}

impl Instance {
    pub(crate) fn new(schema: &str, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            schema: schema.to_string(),
            fields,
        }
    }

    /// Name of the schema this instance was created from.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Returns a field's current value.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Iterates over `(field name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replaces a declared field's value. Undeclared names are ignored.
    pub(crate) fn set(&mut self, field: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| name == field) {
            slot.1 = value;
        }
    }

    /// Converts to a JSON object keyed by declared field names.
    pub fn to_json(&self) -> Value {
        self.render(false)
    }

    /// Converts to a JSON object keyed by snake_case wire keys, the shape
    /// the decoder reads back when key transformation is enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_mapper_core::SchemaDefinition;
    /// use serde_json::json;
    ///
    /// let schema = SchemaDefinition::builder("Profile")
    ///     .field("displayName", "anon")
    ///     .build()
    ///     .unwrap();
    /// let instance = schema.instantiate();
    /// assert_eq!(instance.to_wire_json(), json!({ "display_name": "anon" }));
    /// assert_eq!(instance.to_json(), json!({ "displayName": "anon" }));
    /// ```
    pub fn to_wire_json(&self) -> Value {
        self.render(true)
    }

    fn render(&self, wire: bool) -> Value {
        let object = self
            .fields
            .iter()
            .map(|(name, value)| {
                let key = if wire {
                    to_snake_case(name)
                } else {
                    name.clone()
                };
                (key, value.render(wire))
            })
            .collect();
        Value::Object(object)
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
