//! Schema-directed JSON decoding.
//!
//! Given a [`SchemaDefinition`] (field names, default values and optional
//! custom rules) and an untyped [`serde_json::Value`], the engine produces a
//! best-effort populated [`Instance`] together with every mismatch it found,
//! each tagged with a dotted path to the offending field. Decoding never
//! stops at the first problem.
//!
//! - [`SchemaDefinition`] / [`SchemaBuilder`]: declarative field-descriptor
//!   table; each field's [`ExpectedType`] is inferred from its default.
//! - [`TemplateRegistry`]: per-schema custom rules ([`CustomMapper`]) and
//!   "ignore decode error" flags.
//! - [`SchemaCatalog`]: named schemas, used to resolve nested-schema rules.
//! - [`decode`]: the engine itself, returning a [`DecodeResult`].
//!
//! # Example
//!
//! ```
//! use json_mapper_core::*;
//! use serde_json::json;
//!
//! let user = SchemaDefinition::builder("User").field("name", "").build().unwrap();
//! let test = SchemaDefinition::builder("Test")
//!     .field("str", "")
//!     .field("friends", FieldValue::empty_array())
//!     .map("friends", CustomMapper::nested("User"))
//!     .build()
//!     .unwrap();
//! let catalog = SchemaCatalog::builder().register(user).register(test).build().unwrap();
//!
//! let result = catalog
//!     .decode("Test", &json!({"str": "a", "friends": [{"name": "b"}, null]}), &DecodeOptions::default())
//!     .unwrap();
//!
//! assert_eq!(
//!     result.instance.to_json(),
//!     json!({"str": "a", "friends": [{"name": "b"}, {"name": ""}]})
//! );
//! assert_eq!(
//!     result.errors(),
//!     ["`Test.friends.1` -> `User.name` not exists mapping value."]
//! );
//! ```

mod catalog;
pub mod coerce;
mod decode;
mod error;
pub mod message;
mod naming;
mod registry;
mod schema;
mod value;

pub use catalog::{CatalogBuilder, SchemaCatalog};
pub use decode::{DecodeOptions, DecodeResult, decode};
pub use error::{CatalogError, DeclarationError};
pub use naming::to_snake_case;
pub use registry::{ConvertFn, CustomMapper, Errors, PrimitiveKind, TemplateRegistry};
pub use schema::{FieldDescriptor, SchemaBuilder, SchemaDefinition};
pub use value::{ExpectedType, FieldValue, Instance};
