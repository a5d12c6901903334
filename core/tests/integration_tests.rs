use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use json_mapper_core::*;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_nullable_string(calls: Arc<AtomicUsize>) -> CustomMapper {
    CustomMapper::convert(move |raw: &Value| {
        calls.fetch_add(1, Ordering::SeqCst);
        let errors = raw
            .is_number()
            .then(|| vec!["data type is number!".to_string()]);
        let value = match raw {
            Value::Null => Value::Null,
            other => Value::String(coerce::string_form(other)),
        };
        (value, errors)
    })
}

fn user_schema() -> SchemaDefinition {
    SchemaDefinition::builder("User").field("name", "").build().unwrap()
}

fn test_catalog(calls: Arc<AtomicUsize>) -> SchemaCatalog {
    let user = user_schema();
    let test = SchemaDefinition::builder("Test")
        .field("str", "")
        .field("camelCaseProp", "default-value")
        .field("num", -1)
        .field("bool", false)
        .field("nil", FieldValue::null())
        .field("str2", "test")
        .ignore_error("str2")
        .field("user", user.instantiate())
        .map("user", CustomMapper::nested("User"))
        .field("friends", FieldValue::empty_array())
        .map("friends", CustomMapper::nested("User"))
        .field("arrayOfString", FieldValue::empty_array())
        .map("arrayOfString", CustomMapper::Coerce(PrimitiveKind::String))
        .field("nullableStr", "default-value")
        .map("nullableStr", to_nullable_string(calls))
        .build()
        .unwrap();

    SchemaCatalog::builder()
        .register(user)
        .register(test)
        .build()
        .unwrap()
}

fn decode_test(raw: Value, options: DecodeOptions) -> (DecodeResult, usize) {
    let calls = Arc::new(AtomicUsize::new(0));
    let catalog = test_catalog(Arc::clone(&calls));
    let result = catalog.decode("Test", &raw, &options).unwrap();
    (result, calls.load(Ordering::SeqCst))
}

fn expected_valid() -> Value {
    json!({
        "str": "test1",
        "camelCaseProp": "test3",
        "num": 1234,
        "bool": true,
        "nil": null,
        "str2": "test",
        "user": { "name": "user1" },
        "friends": [{ "name": "user1" }, { "name": "user2" }, { "name": "user3" }],
        "arrayOfString": ["test4"],
        "nullableStr": "test5",
    })
}

// ---------------------------------------------------------------------------
// Valid input
// ---------------------------------------------------------------------------

#[test]
fn test_mapping_with_valid_values() {
    let (result, calls) = decode_test(
        json!({
            "str": "test1",
            "camel_case_prop": "test3",
            "num": 1234,
            "bool": true,
            "nil": null,
            "user": { "name": "user1" },
            "friends": [
                { "name": "user1", "email": "user1@example.com" },
                { "name": "user2" },
                { "name": "user3" },
            ],
            "array_of_string": ["test4"],
            "nullable_str": "test5",
            "hogehoge": 1111,
        }),
        DecodeOptions::default(),
    );

    assert_eq!(result.instance.to_json(), expected_valid());
    assert_eq!(result.errors, None);
    assert_eq!(calls, 1);
}

#[test]
fn test_mapping_with_verbatim_keys() {
    let (result, _) = decode_test(
        json!({
            "str": "test1",
            "camelCaseProp": "test3",
            "num": 1234,
            "bool": true,
            "nil": null,
            "str2": "test",
            "user": { "name": "user1" },
            "friends": [
                { "name": "user1", "email": "user1@example.com" },
                { "name": "user2" },
                { "name": "user3" },
            ],
            "arrayOfString": ["test4"],
            "nullableStr": "test5",
            "hogehoge": 1111,
        }),
        DecodeOptions {
            disable_transform_keys: true,
        },
    );

    assert_eq!(result.instance.to_json(), expected_valid());
    assert!(result.is_clean());
}

#[test]
fn test_mapping_with_null_values() {
    let (result, calls) = decode_test(
        json!({
            "str": "test1",
            "camel_case_prop": "test3",
            "num": 1234,
            "bool": false,
            "nil": null,
            "user": { "name": "user1" },
            "friends": [{ "name": "user1" }, { "name": "user2" }, { "name": "user3" }],
            "array_of_string": ["test4"],
            "nullable_str": null,
        }),
        DecodeOptions::default(),
    );

    let mut expected = expected_valid();
    expected["bool"] = json!(false);
    expected["nullableStr"] = Value::Null;
    assert_eq!(result.instance.to_json(), expected);
    assert!(result.is_clean());
    assert_eq!(calls, 1);
}

// ---------------------------------------------------------------------------
// Missing and mismatched input
// ---------------------------------------------------------------------------

#[test]
fn test_mapping_with_empty_values() {
    let (result, calls) = decode_test(json!({}), DecodeOptions::default());

    assert_eq!(
        result.instance.to_json(),
        json!({
            "str": "",
            "camelCaseProp": "default-value",
            "num": -1,
            "bool": false,
            "nil": null,
            "str2": "test",
            "user": { "name": "" },
            "friends": [],
            "arrayOfString": [],
            "nullableStr": "default-value",
        })
    );
    assert_eq!(
        result.errors(),
        [
            "`Test.str` not exists mapping value.",
            "`Test.camelCaseProp` not exists mapping value.",
            "`Test.num` not exists mapping value.",
            "`Test.bool` not exists mapping value.",
            "`Test.nil` not exists mapping value.",
            "`Test.user` not exists mapping value.",
            "`Test.friends` not exists mapping value.",
            "`Test.arrayOfString` not exists mapping value.",
            "`Test.nullableStr` not exists mapping value.",
        ]
    );
    assert_eq!(calls, 0);
}

#[test]
fn test_mapping_with_mismatched_type_values() {
    let (result, _) = decode_test(
        json!({
            "str": 111,
            "camel_case_prop": 2222,
            "num": "1234",
            "bool": "",
            "nil": 0,
            "str2": null,
            "user": { "name": null },
            "friends": [
                { "name": 1111, "email": "user1#@example.com" },
                { "name": true, "email": "user1#@example.com" },
                null,
            ],
            "array_of_string": 1111,
            "nullable_str": 1111,
            "hogehoge": 1111,
        }),
        DecodeOptions::default(),
    );

    assert_eq!(
        result.instance.to_json(),
        json!({
            "str": "111",
            "camelCaseProp": "2222",
            "num": 1234,
            "bool": false,
            "nil": null,
            "str2": "",
            "user": { "name": "" },
            "friends": [{ "name": "1111" }, { "name": "true" }, { "name": "" }],
            "arrayOfString": [],
            "nullableStr": "1111",
        })
    );
    assert_eq!(
        result.errors(),
        [
            "`Test.str` type mismatch. expected-type: `string` actual: `111`",
            "`Test.camelCaseProp` type mismatch. expected-type: `string` actual: `2222`",
            "`Test.num` type mismatch. expected-type: `number` actual: `\"1234\"`",
            "`Test.bool` type mismatch. expected-type: `boolean` actual: `\"\"`",
            "`Test.nil` type mismatch. expected-type: `null` actual: `0`",
            "`Test.user` -> `User.name` type mismatch. expected-type: `string` actual: `null`",
            "`Test.friends.0` -> `User.name` type mismatch. expected-type: `string` actual: `1111`",
            "`Test.friends.1` -> `User.name` type mismatch. expected-type: `string` actual: `true`",
            "`Test.friends.2` -> `User.name` not exists mapping value.",
            "`Test.arrayOfString` type mismatch. expected-type: `array` actual: `1111`",
            "`Test.nullableStr` -> data type is number!",
        ]
    );
}

#[test]
fn test_array_length_is_preserved_despite_element_errors() {
    let (result, _) = decode_test(
        json!({ "friends": [null, 1, "x", { "name": "ok" }] }),
        DecodeOptions::default(),
    );
    let friends = result.instance.get("friends").and_then(FieldValue::as_array).unwrap();
    assert_eq!(friends.len(), 4);
    assert!(friends.iter().all(|friend| friend.as_instance().is_some()));

    let friend_errors: Vec<_> = result
        .errors()
        .iter()
        .filter(|err| err.starts_with("`Test.friends."))
        .cloned()
        .collect();
    assert_eq!(
        friend_errors,
        vec![
            "`Test.friends.0` -> `User.name` not exists mapping value.",
            "`Test.friends.1` -> `User.name` not exists mapping value.",
            "`Test.friends.2` -> `User.name` not exists mapping value.",
        ]
    );
}

// ---------------------------------------------------------------------------
// Nesting
// ---------------------------------------------------------------------------

#[test]
fn test_errors_compose_across_three_levels() {
    let user = user_schema();
    let team = SchemaDefinition::builder("Team")
        .field("members", FieldValue::empty_array())
        .map("members", CustomMapper::nested("User"))
        .build()
        .unwrap();
    let org = SchemaDefinition::builder("Org")
        .field("teams", FieldValue::empty_array())
        .map("teams", CustomMapper::nested("Team"))
        .build()
        .unwrap();
    let catalog = SchemaCatalog::builder()
        .register(user)
        .register(team)
        .register(org)
        .build()
        .unwrap();

    let result = catalog
        .decode(
            "Org",
            &json!({ "teams": [{ "members": [] }, { "members": [{ "name": 5 }] }] }),
            &DecodeOptions::default(),
        )
        .unwrap();

    assert_eq!(
        result.errors(),
        ["`Org.teams.1` -> `Team.members.0` -> `User.name` type mismatch. expected-type: `string` actual: `5`"]
    );
    assert_eq!(
        result.instance.to_json(),
        json!({ "teams": [{ "members": [] }, { "members": [{ "name": "5" }] }] })
    );
}

#[test]
fn test_ignore_on_parent_field_drops_bubbled_errors_only_there() {
    let user = SchemaDefinition::builder("User")
        .field("name", "")
        .field("nickname", "")
        .ignore_error("nickname")
        .build()
        .unwrap();
    let test = SchemaDefinition::builder("Test")
        .field("quiet", user.instantiate())
        .map("quiet", CustomMapper::nested("User"))
        .ignore_error("quiet")
        .field("loud", user.instantiate())
        .map("loud", CustomMapper::nested("User"))
        .build()
        .unwrap();
    let catalog = SchemaCatalog::builder()
        .register(user)
        .register(test)
        .build()
        .unwrap();

    let result = catalog
        .decode("Test", &json!({ "quiet": {}, "loud": {} }), &DecodeOptions::default())
        .unwrap();
    assert_eq!(result.errors(), ["`Test.loud` -> `User.name` not exists mapping value."]);
}

#[test]
fn test_nested_field_without_rule_passes_through() {
    let user = user_schema();
    let test = SchemaDefinition::builder("Test")
        .field("user", user.instantiate())
        .build()
        .unwrap();
    let catalog = SchemaCatalog::builder()
        .register(user)
        .register(test)
        .build()
        .unwrap();

    let result = catalog
        .decode("Test", &json!({ "user": { "name": 1, "extra": true } }), &DecodeOptions::default())
        .unwrap();
    assert!(result.is_clean());
    assert_eq!(
        result.instance.get("user"),
        Some(&FieldValue::Json(json!({ "name": 1, "extra": true })))
    );
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_wire_json_round_trip_for_primitive_schema() {
    let schema = SchemaDefinition::builder("Settings")
        .field("displayName", "")
        .field("maxRetries", 0)
        .field("verbose", false)
        .field("ratio", 0.5)
        .build()
        .unwrap();
    let catalog = SchemaCatalog::single(schema).unwrap();
    let options = DecodeOptions::default();

    let first = catalog
        .decode(
            "Settings",
            &json!({ "display_name": "box", "max_retries": 3, "verbose": true, "ratio": 0.25 }),
            &options,
        )
        .unwrap();
    assert!(first.is_clean());

    let second = catalog
        .decode("Settings", &first.instance.to_wire_json(), &options)
        .unwrap();
    assert!(second.is_clean());
    assert_eq!(second.instance, first.instance);
}

#[test]
fn test_decoding_is_safe_across_threads() {
    let catalog = Arc::new(test_catalog(Arc::new(AtomicUsize::new(0))));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || {
                catalog
                    .decode("Test", &json!({ "str": format!("t{i}") }), &DecodeOptions::default())
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        assert_eq!(result.instance.get("str"), Some(&FieldValue::from(format!("t{i}"))));
        assert_eq!(result.errors().len(), 8);
    }
}
