//! Primitive coercion.
//!
//! Every coercion produces a value, always. The accompanying `invalid` flag
//! reports only whether the raw value already had the expected JSON type;
//! the value itself is a lenient best-effort conversion. A mismatched field
//! therefore gets both an error message and a usable value.

use serde_json::Value;

use crate::registry::PrimitiveKind;

/// Largest integer that converts to and from `f64` without loss.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Result of a primitive coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Value,
    /// `true` when the raw value did not have the expected JSON type.
    pub invalid: bool,
}

/// Coerces to a number; valid only for JSON numbers.
///
/// Strings are parsed after trimming (empty means `0`, `0x`/`0o`/`0b`
/// prefixes are honoured), booleans become `1`/`0`, `null` becomes `0`,
/// arrays are parsed from their [`string_form`] (so `[]` is `0` and `["7"]`
/// is `7`). Anything else, and any non-finite result, becomes `0`.
pub fn number(raw: &Value) -> Coerced {
    let value = match raw {
        Value::Number(_) => raw.clone(),
        _ => number_value(numeric(raw).filter(|n| n.is_finite()).unwrap_or(0.0)),
    };
    Coerced {
        value,
        invalid: !raw.is_number(),
    }
}

/// Coerces to a string; valid only for JSON strings. See [`string_form`].
pub fn string(raw: &Value) -> Coerced {
    Coerced {
        value: Value::String(string_form(raw)),
        invalid: !raw.is_string(),
    }
}

/// Coerces to a boolean; valid only for JSON booleans.
///
/// The value is `true` exactly when the raw value's string form is `"true"`.
pub fn boolean(raw: &Value) -> Coerced {
    Coerced {
        value: Value::Bool(string_form(raw) == "true"),
        invalid: !raw.is_boolean(),
    }
}

/// Coerces to `null`; valid only for `null`. The value is always `null`.
pub fn null(raw: &Value) -> Coerced {
    Coerced {
        value: Value::Null,
        invalid: !raw.is_null(),
    }
}

/// Conversion applied by [`CustomMapper::Coerce`](crate::CustomMapper::Coerce) rules.
///
/// Unlike the field coercions above, this follows the primitive constructors:
/// `String` renders `null` as `"null"`, `Boolean` tests truthiness, and
/// `Number` yields `null` for input that has no finite numeric value.
///
/// # Examples
///
/// ```
/// use json_mapper_core::PrimitiveKind;
/// use json_mapper_core::coerce::construct;
/// use serde_json::json;
///
/// assert_eq!(construct(PrimitiveKind::String, &json!(null)), json!("null"));
/// assert_eq!(construct(PrimitiveKind::String, &json!([1, 2])), json!("1,2"));
/// assert_eq!(construct(PrimitiveKind::Boolean, &json!("false")), json!(true));
/// assert_eq!(construct(PrimitiveKind::Number, &json!("12")), json!(12));
/// assert_eq!(construct(PrimitiveKind::Number, &json!("abc")), json!(null));
/// ```
pub fn construct(kind: PrimitiveKind, raw: &Value) -> Value {
    match kind {
        PrimitiveKind::String => Value::String(text(raw)),
        PrimitiveKind::Number => match raw {
            Value::Number(_) => raw.clone(),
            _ => numeric(raw)
                .filter(|n| n.is_finite())
                .map_or(Value::Null, number_value),
        },
        PrimitiveKind::Boolean => Value::Bool(truthy(raw)),
    }
}

/// Returns the textual form of a raw value used by string conversion.
///
/// `null` becomes the empty string; everything else renders the way the
/// `String` constructor does: booleans `true`/`false`, numbers in their
/// shortest form (integral floats drop the fraction), arrays as their
/// elements joined with `,` (nested arrays flattened, `null` elements
/// empty), objects as `[object Object]`.
///
/// # Examples
///
/// ```
/// use json_mapper_core::coerce::string_form;
/// use serde_json::json;
///
/// assert_eq!(string_form(&json!("abc")), "abc");
/// assert_eq!(string_form(&json!(null)), "");
/// assert_eq!(string_form(&json!(2.0)), "2");
/// assert_eq!(string_form(&json!(true)), "true");
/// assert_eq!(string_form(&json!([1, [2, null], "x"])), "1,2,,x");
/// assert_eq!(string_form(&json!({"a": 1})), "[object Object]");
/// ```
pub fn string_form(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        _ => text(raw),
    }
}

fn text(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(string_form)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn numeric(raw: &Value) -> Option<f64> {
    match raw {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        Value::Array(_) => parse_numeric(&string_form(raw)),
        Value::Object(_) => None,
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    // `f64::from_str` also accepts words like "inf" and "nan"; plain decimal
    // notation only.
    let decimal = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !decimal {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Digits only: no sign, no separators, any width.
fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|digit| acc * f64::from(radix) + f64::from(digit))
    })
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
