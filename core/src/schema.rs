//! Schema definitions and the declarative field-descriptor table.
//!
//! A [`SchemaDefinition`] lists its fields in declaration order, each with a
//! default value whose runtime type seeds the field's [`ExpectedType`]. Custom
//! rules live in the schema's own [`TemplateRegistry`]. Definitions are
//! declared once through [`SchemaBuilder`] and never mutated afterwards.

use std::collections::HashSet;

use tracing::debug;

use crate::error::DeclarationError;
use crate::registry::{CustomMapper, TemplateRegistry};
use crate::value::{ExpectedType, FieldValue, Instance};

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    default: FieldValue,
    expected: ExpectedType,
}

impl FieldDescriptor {
    fn new(name: String, default: FieldValue) -> Self {
        let expected = default.expected_type();
        Self {
            name,
            default,
            expected,
        }
    }

    /// Declared field name (camelCase identifier style).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template default value.
    pub fn default_value(&self) -> &FieldValue {
        &self.default
    }

    /// Expected type inferred from the default value.
    pub fn expected_type(&self) -> ExpectedType {
        self.expected
    }
}

/// A named template describing expected fields and their conversion rules.
///
/// # Examples
///
/// ```
/// use json_mapper_core::*;
///
/// let user = SchemaDefinition::builder("User").field("name", "").build().unwrap();
///
/// let team = SchemaDefinition::builder("Team")
///     .field("title", "")
///     .field("lead", user.instantiate())
///     .map("lead", CustomMapper::nested("User"))
///     .field("members", FieldValue::empty_array())
///     .map("members", CustomMapper::nested("User"))
///     .field("legacyCode", -1)
///     .ignore_error("legacyCode")
///     .build()
///     .unwrap();
///
/// assert_eq!(team.fields().len(), 4);
/// assert_eq!(team.field("lead").unwrap().expected_type(), ExpectedType::Unknown);
/// assert!(team.registry().is_error_ignored("legacyCode"));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    name: String,
    fields: Vec<FieldDescriptor>,
    registry: TemplateRegistry,
}

impl SchemaDefinition {
    /// Starts declaring a schema named `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Schema (class) name used in error paths.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Custom rules of this schema.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Creates a blank instance holding every field's default value.
    pub fn instantiate(&self) -> Instance {
        let fields = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.default.clone()))
            .collect();
        Instance::new(&self.name, fields)
    }
}

/// Declarative builder for a [`SchemaDefinition`].
///
/// Fields, rules and ignore flags may be given in any order; everything is
/// checked in [`build`](SchemaBuilder::build).
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    parent: Option<SchemaDefinition>,
    fields: Vec<(String, FieldValue)>,
    mappers: Vec<(String, CustomMapper)>,
    ignored: Vec<String>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            mappers: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Inherits every field, rule and ignore flag of `parent`.
    ///
    /// Inherited fields come first, in the parent's order. Declaring a field
    /// the parent already has replaces its default in place; a rule given
    /// here replaces the inherited one. Ignore flags only accumulate.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_mapper_core::*;
    ///
    /// let nest = SchemaDefinition::builder("Nest").field("id", 0).build().unwrap();
    /// let child = SchemaDefinition::builder("Child")
    ///     .extends(&nest)
    ///     .field("label", "")
    ///     .build()
    ///     .unwrap();
    ///
    /// let names: Vec<_> = child.fields().iter().map(FieldDescriptor::name).collect();
    /// assert_eq!(names, ["id", "label"]);
    /// ```
    pub fn extends(mut self, parent: &SchemaDefinition) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declares a field with its default value.
    pub fn field(mut self, name: impl Into<String>, default: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), default.into()));
        self
    }

    /// Attaches a custom rule to a field.
    pub fn map(mut self, field: impl Into<String>, rule: CustomMapper) -> Self {
        self.mappers.push((field.into(), rule));
        self
    }

    /// Suppresses decode error messages for a field.
    pub fn ignore_error(mut self, field: impl Into<String>) -> Self {
        self.ignored.push(field.into());
        self
    }

    /// Validates the declaration and produces the immutable definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeclarationError`] found: an empty schema or field
    /// name, a field declared twice in this builder, a rule or flag on a
    /// field that is neither declared nor inherited, or a second rule on the
    /// same field.
    pub fn build(self) -> Result<SchemaDefinition, DeclarationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DeclarationError::EmptySchemaName);
        }
        let name = name.to_string();

        let mut fields: Vec<(String, FieldValue)> = match &self.parent {
            Some(parent) => parent
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.default.clone()))
                .collect(),
            None => Vec::new(),
        };

        let mut declared: HashSet<String> = HashSet::new();
        for (field, default) in self.fields {
            if field.trim().is_empty() {
                return Err(DeclarationError::EmptyFieldName(name));
            }
            if !declared.insert(field.clone()) {
                return Err(DeclarationError::DuplicateField { schema: name, field });
            }
            match fields.iter_mut().find(|(existing, _)| *existing == field) {
                Some(slot) => slot.1 = default,
                None => fields.push((field, default)),
            }
        }
        let known: HashSet<&str> = fields.iter().map(|(field, _)| field.as_str()).collect();

        let mut registry = TemplateRegistry::new(&name);
        for (field, rule) in self.mappers {
            if !known.contains(field.as_str()) {
                return Err(DeclarationError::UnknownField { schema: name, field });
            }
            registry.register_mapper(&field, rule)?;
        }
        for field in self.ignored {
            if !known.contains(field.as_str()) {
                return Err(DeclarationError::UnknownField { schema: name, field });
            }
            registry.register_ignore_error(&field);
        }
        if let Some(parent) = &self.parent {
            for field in parent.fields() {
                let field = field.name();
                if let Some(rule) = parent.registry.mapper(field) {
                    if registry.mapper(field).is_none() {
                        registry.register_mapper(field, rule.clone())?;
                    }
                }
                if parent.registry.is_error_ignored(field) {
                    registry.register_ignore_error(field);
                }
            }
        }
        debug_assert!(registry.field_names().all(|field| known.contains(field)));

        let fields: Vec<FieldDescriptor> = fields
            .into_iter()
            .map(|(field, default)| FieldDescriptor::new(field, default))
            .collect();

        debug!(
            schema = %name,
            parent = self.parent.as_ref().map(SchemaDefinition::name),
            fields = fields.len(),
            "Declared schema"
        );

        Ok(SchemaDefinition {
            name,
            fields,
            registry,
        })
    }
}
