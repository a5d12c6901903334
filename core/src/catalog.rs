//! Schema catalogs.
//!
//! A [`SchemaCatalog`] holds every declared [`SchemaDefinition`] by name so
//! that nested-schema rules (including self references) can be resolved
//! during decoding. Catalogs are assembled once through [`CatalogBuilder`]
//! and are read-only afterwards, so one catalog can serve concurrent decode
//! calls.

use std::collections::HashMap;

use serde_json::Value;

use crate::decode::{DecodeOptions, DecodeResult, decode};
use crate::error::CatalogError;
use crate::registry::CustomMapper;
use crate::schema::SchemaDefinition;
use crate::value::Instance;

/// Read-only collection of schema definitions with lookup by name.
///
/// # Examples
///
/// ```
/// use json_mapper_core::*;
/// use serde_json::json;
///
/// let node = SchemaDefinition::builder("Node")
///     .field("label", "")
///     .field("children", FieldValue::empty_array())
///     .map("children", CustomMapper::nested("Node"))
///     .build()
///     .unwrap();
/// let catalog = SchemaCatalog::builder().register(node).build().unwrap();
///
/// let result = catalog
///     .decode("Node", &json!({"label": "root", "children": [{"label": "leaf", "children": []}]}), &DecodeOptions::default())
///     .unwrap();
/// assert!(result.is_clean());
/// assert_eq!(
///     result.instance.to_json(),
///     json!({"label": "root", "children": [{"label": "leaf", "children": []}]})
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, SchemaDefinition>,
    order: Vec<String>,
}

impl SchemaCatalog {
    /// Returns a new [`CatalogBuilder`].
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Builds a catalog holding a single schema.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnresolvedReference`] if the schema maps a
    /// field through any schema other than itself.
    pub fn single(schema: SchemaDefinition) -> Result<Self, CatalogError> {
        Self::builder().register(schema).build()
    }

    /// Returns a schema by name.
    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(name)
    }

    /// Returns `true` if the catalog holds a schema named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schema names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Looks up the custom rule for `field` through the instance's schema.
    pub fn lookup_mapper(&self, instance: &Instance, field: &str) -> Option<&CustomMapper> {
        self.get(instance.schema_name())
            .and_then(|schema| schema.registry().mapper(field))
    }

    /// Returns `true` if decode errors on `field` of the instance's schema
    /// are suppressed.
    pub fn is_error_ignored(&self, instance: &Instance, field: &str) -> bool {
        self.get(instance.schema_name())
            .is_some_and(|schema| schema.registry().is_error_ignored(field))
    }

    /// Decodes `raw` with the schema named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownSchema`] if no such schema exists.
    /// Problems in `raw` never produce an `Err`; they are reported in
    /// [`DecodeResult::errors`].
    pub fn decode(
        &self,
        name: &str,
        raw: &Value,
        options: &DecodeOptions,
    ) -> Result<DecodeResult, CatalogError> {
        let schema = self
            .get(name)
            .ok_or_else(|| CatalogError::UnknownSchema(name.to_string()))?;
        Ok(decode(self, schema, raw, options))
    }
}

/// Builder assembling a [`SchemaCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    schemas: Vec<SchemaDefinition>,
}

impl CatalogBuilder {
    /// Adds a schema definition.
    pub fn register(mut self, schema: SchemaDefinition) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateSchema`] if two schemas share a name,
    /// or [`CatalogError::UnresolvedReference`] if a nested-schema rule
    /// names a schema that was not registered.
    pub fn build(self) -> Result<SchemaCatalog, CatalogError> {
        let mut catalog = SchemaCatalog::default();
        for schema in self.schemas {
            let name = schema.name().to_string();
            if catalog.schemas.contains_key(&name) {
                return Err(CatalogError::DuplicateSchema(name));
            }
            catalog.order.push(name.clone());
            catalog.schemas.insert(name, schema);
        }

        for name in &catalog.order {
            let schema = &catalog.schemas[name];
            // Field order keeps the reported error deterministic.
            for field in schema.fields() {
                let target = schema
                    .registry()
                    .mapper(field.name())
                    .and_then(CustomMapper::nested_schema);
                if let Some(target) = target {
                    if !catalog.schemas.contains_key(target) {
                        return Err(CatalogError::UnresolvedReference {
                            schema: name.clone(),
                            field: field.name().to_string(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }

        Ok(catalog)
    }
}
