//! The decode engine.
//!
//! Walks a schema's fields in declaration order, looks each one up in the
//! raw JSON value, coerces or delegates it, and collects every mismatch as a
//! path-tagged message. Decoding never stops at the first problem: every
//! field ends up with some value (its default, a lenient conversion, or the
//! result of a custom rule) and all messages are returned together.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::catalog::SchemaCatalog;
use crate::coerce;
use crate::message;
use crate::naming::to_snake_case;
use crate::registry::{CustomMapper, Errors};
use crate::schema::{FieldDescriptor, SchemaDefinition};
use crate::value::{ExpectedType, FieldValue, Instance};

/// Options recognized by [`decode`].
///
/// # Examples
///
/// ```
/// use json_mapper_core::DecodeOptions;
///
/// let options: DecodeOptions = serde_json::from_str("{}").unwrap();
/// assert!(!options.disable_transform_keys);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Look the top-level schema's fields up by their declared names instead
    /// of snake_case keys. Nested schemas are unaffected.
    #[serde(default)]
    pub disable_transform_keys: bool,
}

/// Populated instance plus every mismatch found while decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    /// Always present, even when errors occurred.
    pub instance: Instance,
    /// `None` when the value decoded cleanly; otherwise a non-empty list in
    /// field declaration order (array elements by index).
    pub errors: Errors,
}

impl DecodeResult {
    /// Returns `true` when no errors were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_none()
    }

    /// Recorded errors; empty when clean.
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Splits into `(instance, errors)`.
    pub fn into_parts(self) -> (Instance, Errors) {
        (self.instance, self.errors)
    }
}

/// Decodes `raw` into an instance of `schema`.
///
/// Nested-schema rules are resolved through `catalog` and always decode
/// with default options, whatever `options` holds. The call is pure: it
/// reads the catalog, allocates a fresh instance and error list, and never
/// fails.
///
/// # Examples
///
/// ```
/// use json_mapper_core::*;
/// use serde_json::json;
///
/// let schema = SchemaDefinition::builder("Test")
///     .field("str", "")
///     .field("num", -1)
///     .build()
///     .unwrap();
/// let catalog = SchemaCatalog::single(schema).unwrap();
/// let schema = catalog.get("Test").unwrap();
///
/// let result = decode(&catalog, schema, &json!({"num": "1234"}), &DecodeOptions::default());
/// assert_eq!(result.instance.to_json(), json!({"str": "", "num": 1234}));
/// assert_eq!(
///     result.errors(),
///     [
///         "`Test.str` not exists mapping value.",
///         "`Test.num` type mismatch. expected-type: `number` actual: `\"1234\"`",
///     ]
/// );
/// ```
pub fn decode(
    catalog: &SchemaCatalog,
    schema: &SchemaDefinition,
    raw: &Value,
    options: &DecodeOptions,
) -> DecodeResult {
    Decoder { catalog, options }.decode_schema(schema, raw)
}

const NESTED_OPTIONS: DecodeOptions = DecodeOptions {
    disable_transform_keys: false,
};

struct Decoder<'a> {
    catalog: &'a SchemaCatalog,
    options: &'a DecodeOptions,
}

impl Decoder<'_> {
    fn decode_schema(&self, schema: &SchemaDefinition, raw: &Value) -> DecodeResult {
        let class = schema.name();
        let mut instance = schema.instantiate();
        let mut errors = Vec::new();

        for field in schema.fields() {
            let name = field.name();
            let key: Cow<'_, str> = if self.options.disable_transform_keys {
                Cow::Borrowed(name)
            } else {
                Cow::Owned(to_snake_case(name))
            };
            let ignored = schema.registry().is_error_ignored(name);

            let Some(value) = raw.as_object().and_then(|object| object.get(key.as_ref())) else {
                trace!(schema = class, field = name, key = %key, "Field not found");
                if !ignored {
                    errors.push(message::missing_value(class, name));
                }
                continue;
            };

            let mapper = schema.registry().mapper(name);
            let mapped = self.cast(class, field, mapper, value, ignored, &mut errors);
            instance.set(name, mapped);
        }

        debug!(schema = class, errors = errors.len(), "Decoded value");

        DecodeResult {
            instance,
            errors: (!errors.is_empty()).then_some(errors),
        }
    }

    fn cast(
        &self,
        class: &str,
        field: &FieldDescriptor,
        mapper: Option<&CustomMapper>,
        raw: &Value,
        ignored: bool,
        errors: &mut Vec<String>,
    ) -> FieldValue {
        let name = field.name();
        let expected = field.expected_type();

        if expected == ExpectedType::Array {
            let Some(items) = raw.as_array() else {
                if !ignored {
                    errors.push(message::type_mismatch(class, name, expected, raw));
                }
                return FieldValue::empty_array();
            };
            // Without an element rule there is nothing to decode elements to.
            let Some(mapper) = mapper else {
                return FieldValue::empty_array();
            };

            let mapped = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let (value, nested) = self.apply(mapper, item);
                    if !ignored {
                        if let Some(nested) = nested {
                            let path = format!("{name}.{index}");
                            errors.extend(message::nested(class, &path, &nested));
                        }
                    }
                    value
                })
                .collect();
            return FieldValue::Array(mapped);
        }

        if let Some(mapper) = mapper {
            let (value, nested) = self.apply(mapper, raw);
            if !ignored {
                if let Some(nested) = nested {
                    errors.extend(message::nested(class, name, &nested));
                }
            }
            return value;
        }

        let coerced = match expected {
            ExpectedType::Number => coerce::number(raw),
            ExpectedType::String => coerce::string(raw),
            ExpectedType::Boolean => coerce::boolean(raw),
            ExpectedType::Null => coerce::null(raw),
            // Nested instances without a rule: passed through untouched.
            ExpectedType::Unknown | ExpectedType::Array => return FieldValue::Json(raw.clone()),
        };
        if coerced.invalid && !ignored {
            errors.push(message::type_mismatch(class, name, expected, raw));
        }
        FieldValue::Json(coerced.value)
    }

    fn apply(&self, mapper: &CustomMapper, raw: &Value) -> (FieldValue, Errors) {
        match mapper {
            CustomMapper::Coerce(kind) => (FieldValue::Json(coerce::construct(*kind, raw)), None),
            CustomMapper::Convert(convert) => {
                let (value, errors) = convert.call(raw);
                (FieldValue::Json(value), errors.filter(|errors| !errors.is_empty()))
            }
            CustomMapper::Nested(target) => match self.catalog.get(target) {
                Some(schema) => {
                    // Options apply to the top-level schema only; nested
                    // schemas always read snake_case keys.
                    let nested = Decoder {
                        catalog: self.catalog,
                        options: &NESTED_OPTIONS,
                    };
                    let result = nested.decode_schema(schema, raw);
                    (FieldValue::Instance(result.instance), result.errors)
                }
                None => {
                    // CatalogBuilder rejects unresolved references, so this
                    // only happens for schemas decoded against a foreign catalog.
                    warn!(schema = %target, "Nested schema not found in catalog");
                    (FieldValue::Json(raw.clone()), None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::PrimitiveKind;

    fn decode_one(schema: SchemaDefinition, raw: Value) -> DecodeResult {
        let catalog = SchemaCatalog::single(schema).unwrap();
        let name = catalog.names().next().unwrap().to_string();
        catalog.decode(&name, &raw, &DecodeOptions::default()).unwrap()
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let schema = SchemaDefinition::builder("Test")
            .field("str", "")
            .field("num", -1)
            .build()
            .unwrap();
        let result = decode_one(schema, json!({}));

        assert_eq!(result.instance.to_json(), json!({"str": "", "num": -1}));
        assert_eq!(
            result.errors,
            Some(vec![
                "`Test.str` not exists mapping value.".to_string(),
                "`Test.num` not exists mapping value.".to_string(),
            ])
        );
    }

    #[test]
    fn test_non_object_input_reports_every_field_missing() {
        let schema = SchemaDefinition::builder("User").field("name", "").build().unwrap();
        for raw in [json!(null), json!([{"name": "x"}]), json!("name"), json!(1)] {
            let result = decode_one(schema.clone(), raw);
            assert_eq!(result.errors(), ["`User.name` not exists mapping value."]);
            assert_eq!(result.instance.to_json(), json!({"name": ""}));
        }
    }

    #[test]
    fn test_clean_decode_has_no_error_sentinel() {
        let schema = SchemaDefinition::builder("Test")
            .field("bool", false)
            .field("nil", FieldValue::null())
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"bool": true, "nil": null, "extra": 1}));
        assert!(result.is_clean());
        assert_eq!(result.errors, None);
        assert!(result.errors().is_empty());
        assert_eq!(result.instance.to_json(), json!({"bool": true, "nil": null}));
    }

    #[test]
    fn test_key_transform_can_be_disabled() {
        let schema = SchemaDefinition::builder("Test")
            .field("camelCaseProp", "default-value")
            .build()
            .unwrap();
        let catalog = SchemaCatalog::single(schema).unwrap();

        let transformed = catalog
            .decode("Test", &json!({"camel_case_prop": "a"}), &DecodeOptions::default())
            .unwrap();
        let verbatim = catalog
            .decode(
                "Test",
                &json!({"camelCaseProp": "a"}),
                &DecodeOptions {
                    disable_transform_keys: true,
                },
            )
            .unwrap();
        assert_eq!(transformed, verbatim);
        assert!(transformed.is_clean());

        let wrong = catalog
            .decode("Test", &json!({"camelCaseProp": "a"}), &DecodeOptions::default())
            .unwrap();
        assert_eq!(wrong.errors(), ["`Test.camelCaseProp` not exists mapping value."]);
    }

    #[test]
    fn test_array_without_rule_becomes_empty() {
        let schema = SchemaDefinition::builder("Test")
            .field("list", json!(["default"]))
            .build()
            .unwrap();
        let result = decode_one(schema.clone(), json!({"list": [1, 2, 3]}));
        assert!(result.is_clean());
        assert_eq!(result.instance.to_json(), json!({"list": []}));

        let result = decode_one(schema, json!({"list": "x"}));
        assert_eq!(
            result.errors(),
            ["`Test.list` type mismatch. expected-type: `array` actual: `\"x\"`"]
        );
        assert_eq!(result.instance.to_json(), json!({"list": []}));
    }

    #[test]
    fn test_array_rule_maps_each_element_with_indexed_paths() {
        let even = CustomMapper::convert(|raw: &Value| match raw.as_i64() {
            Some(n) if n % 2 == 0 => (json!(n), None),
            _ => (Value::Null, Some(vec![format!("{raw} is not even")])),
        });
        let schema = SchemaDefinition::builder("Test")
            .field("evens", FieldValue::empty_array())
            .map("evens", even)
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"evens": [2, 3, 4, "x"]}));

        assert_eq!(result.instance.to_json(), json!({"evens": [2, null, 4, null]}));
        assert_eq!(
            result.errors(),
            [
                "`Test.evens.1` -> 3 is not even",
                "`Test.evens.3` -> \"x\" is not even",
            ]
        );
    }

    #[test]
    fn test_scalar_rule_value_is_used_verbatim() {
        let schema = SchemaDefinition::builder("Test")
            .field("count", 0)
            .map("count", CustomMapper::Coerce(PrimitiveKind::String))
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"count": 12}));
        assert!(result.is_clean());
        assert_eq!(result.instance.to_json(), json!({"count": "12"}));
    }

    #[test]
    fn test_coerce_rules_follow_primitive_constructors() {
        let schema = SchemaDefinition::builder("Test")
            .field("strs", FieldValue::empty_array())
            .map("strs", CustomMapper::Coerce(PrimitiveKind::String))
            .field("flags", FieldValue::empty_array())
            .map("flags", CustomMapper::Coerce(PrimitiveKind::Boolean))
            .field("nums", FieldValue::empty_array())
            .map("nums", CustomMapper::Coerce(PrimitiveKind::Number))
            .build()
            .unwrap();
        let result = decode_one(
            schema,
            json!({
                "strs": [null, [1, 2], "a"],
                "flags": ["false", 1, "x", "", 0],
                "nums": ["3", null, "abc"],
            }),
        );

        assert!(result.is_clean());
        assert_eq!(
            result.instance.to_json(),
            json!({
                "strs": ["null", "1,2", "a"],
                "flags": [true, true, true, false, false],
                "nums": [3, 0, null],
            })
        );
    }

    #[test]
    fn test_nested_schemas_ignore_key_options() {
        let user = SchemaDefinition::builder("User").field("fullName", "").build().unwrap();
        let team = SchemaDefinition::builder("Team")
            .field("teamLead", user.instantiate())
            .map("teamLead", CustomMapper::nested("User"))
            .build()
            .unwrap();
        let catalog = SchemaCatalog::builder().register(user).register(team).build().unwrap();
        let verbatim = DecodeOptions {
            disable_transform_keys: true,
        };

        let result = catalog
            .decode("Team", &json!({"teamLead": {"full_name": "ann"}}), &verbatim)
            .unwrap();
        assert!(result.is_clean());
        assert_eq!(result.instance.to_json(), json!({"teamLead": {"fullName": "ann"}}));

        let result = catalog
            .decode("Team", &json!({"teamLead": {"fullName": "ann"}}), &verbatim)
            .unwrap();
        assert_eq!(
            result.errors(),
            ["`Team.teamLead` -> `User.fullName` not exists mapping value."]
        );
    }

    #[test]
    fn test_convert_reporting_empty_error_list_is_clean() {
        let schema = SchemaDefinition::builder("Test")
            .field("value", FieldValue::null())
            .map("value", CustomMapper::convert(|raw: &Value| (raw.clone(), Some(Vec::new()))))
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"value": 1}));
        assert!(result.is_clean());
    }

    #[test]
    fn test_ignore_error_suppresses_messages_but_keeps_fallbacks() {
        let fail = CustomMapper::convert(|_: &Value| (json!("fallback"), Some(vec!["bad".into()])));
        let schema = SchemaDefinition::builder("Test")
            .field("str2", "test")
            .ignore_error("str2")
            .field("num", 0)
            .ignore_error("num")
            .field("custom", "")
            .map("custom", fail)
            .ignore_error("custom")
            .field("absent", "kept")
            .ignore_error("absent")
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"str2": null, "num": "42", "custom": 1}));

        assert!(result.is_clean());
        assert_eq!(
            result.instance.to_json(),
            json!({"str2": "", "num": 42, "custom": "fallback", "absent": "kept"})
        );
    }

    #[test]
    fn test_unknown_type_without_rule_passes_raw_through() {
        let schema = SchemaDefinition::builder("Test")
            .field("meta", json!({"default": true}))
            .build()
            .unwrap();
        let result = decode_one(schema, json!({"meta": [1, "two"]}));
        assert!(result.is_clean());
        assert_eq!(result.instance.to_json(), json!({"meta": [1, "two"]}));
    }
}
