//! Field-name to wire-key conversion.

/// Converts a camelCase identifier to its snake_case wire key.
///
/// Every ASCII uppercase letter is replaced by `_` followed by its lowercase
/// form; everything else is kept as-is. A leading uppercase letter therefore
/// produces a leading underscore, and runs of capitals are split letter by
/// letter.
///
/// # Examples
///
/// ```
/// use json_mapper_core::to_snake_case;
///
/// assert_eq!(to_snake_case("camelCaseProp"), "camel_case_prop");
/// assert_eq!(to_snake_case("str"), "str");
/// assert_eq!(to_snake_case("userID"), "user_i_d");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
