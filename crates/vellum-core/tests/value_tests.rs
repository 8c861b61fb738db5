//! Behavior tests for the dynamically-typed `JsonValue` tree.

use vellum_core::{to_dynamic, JsonError, JsonKind, JsonValue, Mapper};

#[test]
fn parse_then_serialize_preserves_structure() {
    let text = r#"{"name":"vellum","version":3,"tags":["fast","small"],"extra":null}"#;
    let mut value = to_dynamic(text).unwrap();
    assert_eq!(value.to_json(), text);
}

#[test]
fn object_insertion_order_survives_round_trip() {
    let mut value = to_dynamic(r#"{"zebra": 1, "apple": 2, "mango": 3}"#).unwrap();
    let keys: Vec<_> = value.keys().collect();
    assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    assert_eq!(value.to_json(), r#"{"zebra":1,"apple":2,"mango":3}"#);
}

#[test]
fn numeric_variants_are_distinct() {
    let value = to_dynamic(r#"[42, 9999999999, 3.5]"#).unwrap();
    assert_eq!(value.get_index(0).unwrap().kind(), JsonKind::Int);
    assert_eq!(value.get_index(1).unwrap().kind(), JsonKind::Long);
    assert_eq!(value.get_index(2).unwrap().kind(), JsonKind::Double);

    // Accessors are exact: an Int refuses as_long and as_double.
    let int = value.get_index(0).unwrap();
    assert_eq!(int.as_int().unwrap(), 42);
    assert!(matches!(
        int.as_long(),
        Err(JsonError::TypeMismatch { expected: "long", actual: "int" })
    ));
}

#[test]
fn integral_double_round_trips_as_double() {
    let mut value = to_dynamic("17.0").unwrap();
    assert_eq!(value.kind(), JsonKind::Double);
    assert_eq!(value.to_json(), "17.0");
    let reparsed = to_dynamic(&value.to_json()).unwrap();
    assert_eq!(reparsed.kind(), JsonKind::Double);
}

#[test]
fn cache_survives_reads_and_dies_on_writes() {
    let mut value = JsonValue::new();
    value.insert("a", 1).unwrap();
    assert_eq!(value.to_json(), r#"{"a":1}"#);
    assert_eq!(value.to_json(), r#"{"a":1}"#);

    if let Some(slot) = value.get_mut("a") {
        slot.set_kind(JsonKind::Boolean);
    }
    assert_eq!(value.to_json(), r#"{"a":false}"#);
}

#[test]
fn equality_ignores_serialization_state() {
    let mut a = to_dynamic(r#"{"x": [1, 2]}"#).unwrap();
    let b = to_dynamic(r#"{"x": [1, 2]}"#).unwrap();
    let _ = a.to_json(); // populate a's cache only
    assert_eq!(a, b);

    let c = to_dynamic(r#"{"x": [1, 3]}"#).unwrap();
    assert_ne!(a, c);
}

#[test]
fn variant_aware_equality_distinguishes_number_kinds() {
    assert_ne!(JsonValue::from(1i32), JsonValue::from(1i64));
    assert_ne!(JsonValue::from(1i64), JsonValue::from(1.0));
    assert_eq!(JsonValue::from(1i32), JsonValue::from(1i32));
}

#[test]
fn none_upgrades_by_first_write() {
    let mut obj = JsonValue::new();
    obj.insert("k", "v").unwrap();
    assert!(obj.is_object());

    let mut arr = JsonValue::new();
    arr.push(1).unwrap();
    assert!(arr.is_array());

    // An established variant refuses the other write style.
    assert!(matches!(
        obj.push(1),
        Err(JsonError::TypeMismatch { expected: "array", .. })
    ));
    assert!(matches!(
        arr.insert("k", 1),
        Err(JsonError::TypeMismatch { expected: "object", .. })
    ));
}

#[test]
fn ordinal_access_over_object_entries() {
    let value = to_dynamic(r#"{"first": 10, "second": 20}"#).unwrap();
    assert_eq!(value.get_index(0).unwrap().as_int().unwrap(), 10);
    assert_eq!(value.get_index(1).unwrap().as_int().unwrap(), 20);
    assert!(value.get_index(2).is_none());
}

#[test]
fn pretty_output_reparses_to_equal_tree() {
    let value = to_dynamic(r#"{"a": {"b": [1, null, "s"]}, "c": true}"#).unwrap();
    let pretty = value.to_json_pretty();
    assert!(pretty.contains('\n'));
    let reparsed = to_dynamic(&pretty).unwrap();
    assert_eq!(value, reparsed);
}

#[test]
fn escape_decoding() {
    let value = to_dynamic(r#""a\tbé""#).unwrap();
    assert_eq!(value.as_str().unwrap(), "a\tb\u{e9}");
}

#[test]
fn extensions_accepted_by_default_and_refused_in_strict() {
    let text = "{ 'k': 1 /* note */ } // done";
    let value = to_dynamic(text).unwrap();
    assert_eq!(value.get("k").unwrap().as_int().unwrap(), 1);

    let strict = Mapper::with_config(vellum_core::MapperConfig {
        allow_comments: false,
        allow_single_quoted_strings: false,
        ..Default::default()
    });
    assert!(matches!(
        strict.to_dynamic(text),
        Err(JsonError::Lex { .. })
    ));
}

#[test]
fn deep_nesting_is_refused_without_overflow() {
    let deep = "[".repeat(5000) + &"]".repeat(5000);
    assert!(matches!(
        to_dynamic(&deep),
        Err(JsonError::DepthExceeded { limit: 100 })
    ));
}
