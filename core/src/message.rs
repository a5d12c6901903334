//! Decode error messages.
//!
//! The exact wording is part of the public contract: downstream tooling
//! matches on these strings.

use serde_json::Value;

use crate::value::ExpectedType;

/// `` `Class.field` not exists mapping value. ``
pub fn missing_value(class: &str, field: &str) -> String {
    format!("`{class}.{field}` not exists mapping value.")
}

/// `` `Class.field` type mismatch. expected-type: `type` actual: `json` ``
pub fn type_mismatch(class: &str, field: &str, expected: ExpectedType, actual: &Value) -> String {
    format!("`{class}.{field}` type mismatch. expected-type: `{expected}` actual: `{actual}`")
}

/// Prefixes every nested message with `` `Class.path` -> ``.
pub fn nested<'a>(
    class: &'a str,
    path: &'a str,
    errors: &'a [String],
) -> impl Iterator<Item = String> + 'a {
    errors
        .iter()
        .map(move |err| format!("`{class}.{path}` -> {err}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_value_format() {
        assert_eq!(missing_value("Test", "str"), "`Test.str` not exists mapping value.");
    }

    #[test]
    fn test_type_mismatch_json_encodes_actual() {
        assert_eq!(
            type_mismatch("Test", "num", ExpectedType::Number, &json!("1234")),
            "`Test.num` type mismatch. expected-type: `number` actual: `\"1234\"`"
        );
        assert_eq!(
            type_mismatch("Test", "arrayOfString", ExpectedType::Array, &json!(1111)),
            "`Test.arrayOfString` type mismatch. expected-type: `array` actual: `1111`"
        );
    }

    #[test]
    fn test_nested_prefixes_each_line() {
        let inner = vec!["`User.name` not exists mapping value.".to_string(), "boom".to_string()];
        let lines: Vec<_> = nested("Test", "friends.2", &inner).collect();
        assert_eq!(
            lines,
            vec![
                "`Test.friends.2` -> `User.name` not exists mapping value.",
                "`Test.friends.2` -> boom",
            ]
        );
    }
}
