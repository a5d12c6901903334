//! Advisory declaration checker.
//!
//! Inspects schema declarations without decoding anything and reports
//! fields whose declared type disagrees with how the decoder will treat
//! them: strictly-undefined types, definite-assignment bypasses, repeated
//! rules, arrays or custom types without a rule, rules whose return type
//! differs from the declared type, and broken `extends` chains.
//!
//! # Examples
//!
//! ```
//! use json_mapper_lint::{DeclarationFile, DeclarationFormat, check_document};
//!
//! let yaml = r#"
//! schemas:
//!   - name: Wrong
//!     fields:
//!       - { name: ok, type: string, default: "" }
//!       - { name: tags, type: "string[]", default: [] }
//! "#;
//! let file = DeclarationFile::parse(yaml, DeclarationFormat::Yaml).unwrap();
//! let report = check_document(&file);
//! assert_eq!(
//!     report.get("Wrong").unwrap(),
//!     ["× property: tags  message: `@map` decorator required if array type property", ""]
//! );
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::declaration::{
    DeclarationFile, DeclarationFormat, FieldDeclaration, MapperDeclaration, SchemaDeclaration,
};
use crate::error::{LintError, Result};

const PRIMITIVE_TYPES: [&str; 4] = ["string", "number", "null", "boolean"];

/// Violations of one schema, one line per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolations {
    pub schema: String,
    /// Each violating field contributes its lines followed by an empty line.
    pub messages: Vec<String>,
}

/// Result of checking one declaration document.
///
/// Only schemas with violations are listed, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub schemas: Vec<SchemaViolations>,
}

impl CheckReport {
    /// Returns `true` if no violations were found.
    pub fn is_clean(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the violation lines of a schema.
    pub fn get(&self, schema: &str) -> Option<&[String]> {
        self.schemas
            .iter()
            .find(|entry| entry.schema == schema)
            .map(|entry| entry.messages.as_slice())
    }
}

/// Check result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub report: CheckReport,
}

/// Checks every schema of a declaration document.
///
/// Inherited fields are checked under the derived schema's name as well,
/// ancestors' fields first.
pub fn check_document(file: &DeclarationFile) -> CheckReport {
    let known: HashSet<&str> = file.schemas.iter().map(|schema| schema.name.as_str()).collect();

    let schemas = file
        .schemas
        .iter()
        .filter_map(|schema| {
            let messages: Vec<String> = match file.resolved_fields(schema) {
                Ok(fields) => fields
                    .into_iter()
                    .flat_map(|field| {
                        let mut lines = check_field(field, &known);
                        if !lines.is_empty() {
                            lines.push(String::new());
                        }
                        lines
                    })
                    .collect(),
                Err(err) => vec![inheritance_violation(schema, &err), String::new()],
            };
            if messages.is_empty() {
                return None;
            }
            debug!(schema = %schema.name, lines = messages.len(), "Schema has violations");
            Some(SchemaViolations {
                schema: schema.name.clone(),
                messages,
            })
        })
        .collect();

    CheckReport { schemas }
}

/// Checks a single field; empty when the field is consistent.
pub fn check_field(field: &FieldDeclaration, known_schemas: &HashSet<&str>) -> Vec<String> {
    let name = field.name.as_str();
    let declared = field.declared_type.trim();

    if declared == "undefined" {
        return vec![violation(name, "can't use only undefined type. use `null` instead")];
    }

    if field.definite {
        return vec![violation(
            name,
            "can't use Non-null assertion operator. property initialization is required",
        )];
    }

    if field.map.len() > 1 {
        return vec![violation(
            name,
            "`@map` decorator is called multiple times. it must be called only once.",
        )];
    }

    let rule = field.map.first();
    if let Some(MapperDeclaration::Schema { schema }) = rule {
        if !known_schemas.contains(schema.as_str()) {
            return vec![violation(name, &format!("unknown schema `{schema}`"))];
        }
    }
    let returns = rule.map(|rule| rule.return_type().trim());

    if declared.contains("[]") {
        let Some(returns) = returns else {
            return vec![violation(name, "`@map` decorator required if array type property")];
        };
        let element = unwrap_array_type(declared);
        if element != returns {
            return type_mismatch(name, &element, returns);
        }
        return Vec::new();
    }

    let Some(returns) = returns else {
        if PRIMITIVE_TYPES.contains(&declared) {
            return Vec::new();
        }
        return vec![violation(
            name,
            "`@map` decorator required if union type or custom type",
        )];
    };

    if declared != returns {
        return type_mismatch(name, declared, returns);
    }
    Vec::new()
}

/// Collects declaration files from files and (non-recursively) directories.
///
/// Results are sorted and de-duplicated.
///
/// # Errors
///
/// Returns [`LintError::InvalidInput`] if a path does not exist, or
/// [`LintError::UnsupportedFormat`] if an explicit file has an unsupported
/// extension.
pub fn collect_declaration_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && DeclarationFormat::from_path(&path).is_some() {
                    paths.insert(path);
                }
            }
            continue;
        }

        if input.is_file() {
            if DeclarationFormat::from_path(input).is_none() {
                return Err(LintError::UnsupportedFormat(format!(
                    "'{}' must end in .json, .yml or .yaml",
                    input.display()
                )));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(LintError::InvalidInput(format!(
            "declaration path '{}' does not exist",
            input.display()
        )));
    }

    Ok(paths.into_iter().collect())
}

/// Loads and checks several files in parallel.
///
/// Reports come back in path order.
///
/// # Errors
///
/// Returns the first load error encountered.
pub fn check_paths(paths: &[PathBuf]) -> Result<Vec<FileReport>> {
    let mut reports = paths
        .par_iter()
        .map(|path| check_path(path))
        .collect::<Result<Vec<_>>>()?;
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

/// Loads and checks one file.
///
/// # Errors
///
/// Returns any error from [`DeclarationFile::load`].
pub fn check_path(path: &Path) -> Result<FileReport> {
    let file = DeclarationFile::load(path)?;
    let report = check_document(&file);
    debug!(path = %path.display(), clean = report.is_clean(), "Checked declarations");
    Ok(FileReport {
        path: path.to_path_buf(),
        report,
    })
}

fn inheritance_violation(schema: &SchemaDeclaration, err: &LintError) -> String {
    let parent = schema.extends.as_deref().unwrap_or_default();
    let message = match err {
        LintError::UnknownParent { parent, .. } => format!("unknown schema `{parent}`"),
        LintError::CyclicInheritance(_) => "inheritance cycle".to_string(),
        other => other.to_string(),
    };
    format!("× extends: {parent}  message: {message}")
}

fn unwrap_array_type(declared: &str) -> String {
    declared
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')'))
        .collect()
}

fn violation(property: &str, message: &str) -> String {
    format!("× property: {property}  message: {message}")
}

fn type_mismatch(property: &str, declared: &str, returns: &str) -> Vec<String> {
    vec![
        violation(property, "type mismatch"),
        format!("   property type: {declared}"),
        format!("   custom mapper type: {returns}"),
    ]
}
