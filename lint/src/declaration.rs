//! Schema declaration files.
//!
//! Declarations describe schemas as data (YAML or JSON) so they can be
//! checked ahead of time and loaded into a [`SchemaCatalog`] at runtime.
//!
//! # Example YAML
//!
//! ```yaml
//! schemas:
//!   - name: User
//!     fields:
//!       - { name: name, type: string, default: "" }
//!   - name: Team
//!     fields:
//!       - { name: lead, type: User, default_instance: User, map: [{ schema: User }] }
//!       - { name: members, type: "User[]", default: [], map: [{ schema: User }] }
//!       - name: note
//!         type: string | null
//!         default: null
//!         map: [{ function: nullable_string, returns: string | null }]
//!   - name: NamedTeam
//!     extends: Team
//!     fields:
//!       - { name: slug, type: string, default: "" }
//! ```

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use json_mapper_core::{
    CatalogError, ConvertFn, CustomMapper, FieldValue, PrimitiveKind, SchemaCatalog,
    SchemaDefinition, coerce,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LintError, Result};

/// Serialization format of a declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    Json,
    Yaml,
}

impl DeclarationFormat {
    /// Infers the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("json") => Some(Self::Json),
            Some("yml" | "yaml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A custom rule as written in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapperDeclaration {
    /// `{ primitive: string | number | boolean }`
    Primitive { primitive: PrimitiveKind },
    /// `{ schema: Name }`
    Schema { schema: String },
    /// `{ function: name, returns: "type" }`
    Function { function: String, returns: String },
}

impl MapperDeclaration {
    /// Type text of the value this rule produces.
    pub fn return_type(&self) -> &str {
        match self {
            Self::Primitive { primitive } => primitive.as_str(),
            Self::Schema { schema } => schema,
            Self::Function { returns, .. } => returns,
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// Declared type text, e.g. `string`, `number | null`, `User[]`.
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Default value; `None` when the key is absent (`null` is `Some`).
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// Schema whose blank instance is the default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_instance: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map: Vec<MapperDeclaration>,
    #[serde(default)]
    pub ignore_error: bool,
    /// Declared with a definite-assignment bypass and no initializer.
    #[serde(default)]
    pub definite: bool,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// One declared schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    pub name: String,
    /// Parent schema whose fields, rules and ignore flags are inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// Contents of a declaration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationFile {
    #[serde(default)]
    pub schemas: Vec<SchemaDeclaration>,
}

impl DeclarationFile {
    /// Loads a declaration file, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::UnsupportedFormat`] for unknown extensions,
    /// [`LintError::IoError`] if the file cannot be read, or a JSON/YAML
    /// error if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DeclarationFormat::from_path(path)
            .ok_or_else(|| LintError::UnsupportedFormat(path.display().to_string()))?;
        let raw = fs::read_to_string(path)?;
        let file = Self::parse(&raw, format)?;
        debug!(path = %path.display(), schemas = file.schemas.len(), "Loaded declarations");
        Ok(file)
    }

    /// Parses declaration text.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::JsonError`] or [`LintError::YamlError`] on
    /// malformed input.
    pub fn parse(raw: &str, format: DeclarationFormat) -> Result<Self> {
        Ok(match format {
            DeclarationFormat::Json => serde_json::from_str(raw)?,
            DeclarationFormat::Yaml => serde_yaml::from_str(raw)?,
        })
    }

    /// Returns a schema declaration by name.
    pub fn schema(&self, name: &str) -> Option<&SchemaDeclaration> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    /// Returns `schema` followed by its ancestors, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::UnknownParent`] if an `extends` names an
    /// undeclared schema, or [`LintError::CyclicInheritance`] if the chain
    /// loops back on itself.
    pub fn lineage<'a>(&'a self, schema: &'a SchemaDeclaration) -> Result<Vec<&'a SchemaDeclaration>> {
        let mut chain = vec![schema];
        let mut current = schema;
        while let Some(parent) = current.extends.as_deref() {
            let next = self.schema(parent).ok_or_else(|| LintError::UnknownParent {
                schema: current.name.clone(),
                parent: parent.to_string(),
            })?;
            if chain.iter().any(|seen| seen.name == next.name) {
                return Err(LintError::CyclicInheritance(schema.name.clone()));
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    /// Returns the fields of `schema` including inherited ones.
    ///
    /// Ancestor fields come first. A field redeclared further down the chain
    /// replaces the inherited declaration in place.
    ///
    /// # Errors
    ///
    /// Same as [`lineage`](Self::lineage).
    pub fn resolved_fields<'a>(
        &'a self,
        schema: &'a SchemaDeclaration,
    ) -> Result<Vec<&'a FieldDeclaration>> {
        let mut fields: Vec<&FieldDeclaration> = Vec::new();
        for ancestor in self.lineage(schema)?.into_iter().rev() {
            for field in &ancestor.fields {
                match fields.iter_mut().find(|existing| existing.name == field.name) {
                    Some(slot) => *slot = field,
                    None => fields.push(field),
                }
            }
        }
        Ok(fields)
    }

    /// Builds a [`SchemaCatalog`] from the declarations.
    ///
    /// Schemas are built in file order; `extends` and `default_instance`
    /// must name a schema declared earlier. A derived schema inherits its
    /// parent's fields, rules and ignore flags. Fields marked `definite` without a default
    /// carry no initial value and are therefore not part of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::UnknownParent`] for an `extends` that does not
    /// name an earlier schema, [`LintError::MissingDefault`] for other
    /// fields without a default, [`LintError::UnknownConverter`] for unregistered function
    /// rules, [`LintError::Declaration`] for structural problems (including
    /// more than one rule per field) and [`LintError::Catalog`] for
    /// duplicate schemas or unresolved references.
    ///
    /// # Examples
    ///
    /// ```
    /// use json_mapper_core::DecodeOptions;
    /// use json_mapper_lint::{ConverterTable, DeclarationFile, DeclarationFormat};
    /// use serde_json::json;
    ///
    /// let yaml = r#"
    /// schemas:
    ///   - name: User
    ///     fields:
    ///       - { name: name, type: string, default: "" }
    ///       - { name: nickName, type: string | null, default: null, map: [{ function: nullable_string, returns: string | null }] }
    /// "#;
    /// let file = DeclarationFile::parse(yaml, DeclarationFormat::Yaml).unwrap();
    /// let catalog = file.into_catalog(&ConverterTable::with_builtins()).unwrap();
    ///
    /// let result = catalog
    ///     .decode("User", &json!({"name": "ann", "nick_name": null}), &DecodeOptions::default())
    ///     .unwrap();
    /// assert!(result.is_clean());
    /// ```
    pub fn into_catalog(&self, converters: &ConverterTable) -> Result<SchemaCatalog> {
        let mut built: HashMap<String, SchemaDefinition> = HashMap::new();
        let mut order = Vec::with_capacity(self.schemas.len());

        for schema in &self.schemas {
            let mut builder = SchemaDefinition::builder(schema.name.as_str());
            if let Some(parent) = &schema.extends {
                let inherited = built.get(parent).ok_or_else(|| LintError::UnknownParent {
                    schema: schema.name.clone(),
                    parent: parent.clone(),
                })?;
                builder = builder.extends(inherited);
            }

            for field in &schema.fields {
                let default = match (&field.default_instance, &field.default) {
                    (Some(target), _) => {
                        let nested = built.get(target).ok_or_else(|| {
                            CatalogError::UnresolvedReference {
                                schema: schema.name.clone(),
                                field: field.name.clone(),
                                target: target.clone(),
                            }
                        })?;
                        FieldValue::Instance(nested.instantiate())
                    }
                    (None, Some(value)) => FieldValue::Json(value.clone()),
                    (None, None) if field.definite => continue,
                    (None, None) => {
                        return Err(LintError::MissingDefault {
                            schema: schema.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                };
                builder = builder.field(field.name.as_str(), default);

                for rule in &field.map {
                    builder = builder.map(field.name.as_str(), converters.resolve(rule)?);
                }
                if field.ignore_error {
                    builder = builder.ignore_error(field.name.as_str());
                }
            }

            let definition = builder.build()?;
            order.push(definition.name().to_string());
            if built.insert(definition.name().to_string(), definition).is_some() {
                return Err(CatalogError::DuplicateSchema(schema.name.clone()).into());
            }
        }

        let catalog = order
            .iter()
            .filter_map(|name| built.remove(name))
            .fold(SchemaCatalog::builder(), |builder, schema| builder.register(schema))
            .build()?;
        Ok(catalog)
    }
}

/// Named conversion functions available to `function` rules.
///
/// # Examples
///
/// ```
/// use json_mapper_lint::ConverterTable;
/// use serde_json::{Value, json};
///
/// let mut table = ConverterTable::with_builtins();
/// table.register("upper", |raw: &Value| {
///     (json!(raw.as_str().unwrap_or_default().to_uppercase()), None)
/// });
/// assert!(table.contains("upper"));
/// assert!(table.contains("nullable_string"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConverterTable {
    converters: HashMap<String, ConvertFn>,
}

impl ConverterTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding `nullable_string`, `nullable_number` and
    /// `nullable_boolean`.
    ///
    /// Each passes `null` and values of its own type through untouched;
    /// anything else is leniently converted and reported as an error.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("nullable_string", |raw: &Value| {
            nullable(raw, "string", Value::is_string, coerce::string)
        });
        table.register("nullable_number", |raw: &Value| {
            nullable(raw, "number", Value::is_number, coerce::number)
        });
        table.register("nullable_boolean", |raw: &Value| {
            nullable(raw, "boolean", Value::is_boolean, coerce::boolean)
        });
        table
    }

    /// Registers (or replaces) a converter.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value) -> (Value, json_mapper_core::Errors) + Send + Sync + 'static,
    {
        self.converters.insert(name.into(), ConvertFn::new(f));
        self
    }

    /// Returns `true` if a converter named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Turns a declared rule into a [`CustomMapper`].
    ///
    /// # Errors
    ///
    /// Returns [`LintError::UnknownConverter`] if a function rule names an
    /// unregistered converter.
    pub fn resolve(&self, rule: &MapperDeclaration) -> Result<CustomMapper> {
        Ok(match rule {
            MapperDeclaration::Primitive { primitive } => CustomMapper::Coerce(*primitive),
            MapperDeclaration::Schema { schema } => CustomMapper::nested(schema.as_str()),
            MapperDeclaration::Function { function, .. } => {
                let f = self
                    .converters
                    .get(function)
                    .ok_or_else(|| LintError::UnknownConverter(function.clone()))?;
                CustomMapper::Convert(f.clone())
            }
        })
    }
}

fn nullable(
    raw: &Value,
    type_name: &str,
    matches: fn(&Value) -> bool,
    convert: fn(&Value) -> coerce::Coerced,
) -> (Value, json_mapper_core::Errors) {
    if raw.is_null() || matches(raw) {
        return (raw.clone(), None);
    }
    let message = format!("expected `{type_name} | null` actual: `{raw}`");
    (convert(raw).value, Some(vec![message]))
}
