//! Declaration files, configuration and the advisory declaration checker.
//!
//! Schemas for the [`json_mapper_core`] engine can be declared as YAML or
//! JSON documents. This crate loads those documents, turns them into a
//! [`SchemaCatalog`](json_mapper_core::SchemaCatalog) and checks them ahead of
//! time for declarations the decoder cannot honour.
//!
//! # Quick start
//!
//! ```no_run
//! use json_mapper_lint::{ConverterTable, DeclarationFile, MapperConfig, check_document};
//!
//! let config = MapperConfig::load_or_default("json-mapper.yml").unwrap();
//! let file = DeclarationFile::load("schemas/user.yml").unwrap();
//!
//! let report = check_document(&file);
//! for entry in &report.schemas {
//!     println!("{}: {} line(s)", entry.schema, entry.messages.len());
//! }
//!
//! let catalog = file.into_catalog(&ConverterTable::with_builtins()).unwrap();
//! let raw = serde_json::json!({"name": "ann"});
//! let result = catalog.decode("User", &raw, &config.decode).unwrap();
//! println!("{:?}", result.errors);
//! ```

mod check;
mod config;
mod declaration;
mod error;

pub use check::{
    CheckReport, FileReport, SchemaViolations, check_document, check_field, check_path,
    check_paths, collect_declaration_paths,
};
pub use config::{CONFIG_VERSION, CheckConfig, DEFAULT_CONFIG_FILE, MapperConfig};
pub use declaration::{
    ConverterTable, DeclarationFile, DeclarationFormat, FieldDeclaration, MapperDeclaration,
    SchemaDeclaration,
};
pub use error::{LintError, Result};
