//! Schema front end: parsing, nesting and scope resolution, map lowering,
//! defaults, and resolution errors.

use pbhost::descriptor::{map_entry_type_name, Cardinality, DefaultValue, FieldKind, SchemaError};
use pbhost::{parse, Schema};

#[test]
fn parse_simple_message() {
    let raw = parse(
        r#"
message Point {
  int32 x = 1;
  int32 y = 2;
}
"#,
    )
    .expect("parse");
    assert_eq!(raw.messages.len(), 1);
    assert_eq!(raw.messages[0].name, "Point");
    assert_eq!(raw.messages[0].fields.len(), 2);

    let schema = Schema::resolve(raw).expect("resolve");
    let point = schema.message("Point").expect("Point");
    let x = point.field_by_name("x").expect("x");
    assert_eq!(x.number, 1);
    assert_eq!(x.kind, FieldKind::Int32);
    assert_eq!(x.cardinality, Cardinality::Singular);
    assert_eq!(x.full_name, "Point.x");
    assert!(point.field_by_number(2).is_some());
    assert!(point.field_by_number(3).is_none());
}

#[test]
fn syntax_header_and_comments_are_tolerated() {
    let raw = parse(
        r#"
syntax = "proto3";

// A point in the plane.
message Point {
  int32 x = 1; // abscissa
  int32 y = 2;
}
"#,
    )
    .expect("parse");
    assert_eq!(raw.messages.len(), 1);
}

#[test]
fn labels_and_scalar_kinds() {
    let raw = parse(
        r#"
message Kinds {
  repeated int64 a = 1;
  optional uint32 b = 2;
  uint64 c = 3;
  double d = 4;
  float e = 5;
  bool f = 6;
  string g = 7;
}
"#,
    )
    .expect("parse");
    let schema = Schema::resolve(raw).expect("resolve");
    let kinds = schema.message("Kinds").expect("Kinds");
    assert_eq!(kinds.field_by_name("a").expect("a").cardinality, Cardinality::Repeated);
    assert_eq!(kinds.field_by_name("b").expect("b").cardinality, Cardinality::Singular);
    assert_eq!(kinds.field_by_name("d").expect("d").kind, FieldKind::Double);
    assert_eq!(kinds.field_by_name("g").expect("g").kind, FieldKind::String);
}

#[test]
fn nested_types_resolve_innermost_first() {
    let raw = parse(
        r#"
message Outer {
  message Inner {
    int32 v = 1;
  }
  Inner inner = 1;
  repeated Inner more = 2;
}

message Inner {
  string v = 1;
}
"#,
    )
    .expect("parse");
    let schema = Schema::resolve(raw).expect("resolve");
    let outer = schema.message("Outer").expect("Outer");
    // The nested Inner shadows the top-level one inside Outer.
    assert_eq!(
        outer.field_by_name("inner").expect("inner").type_name.as_deref(),
        Some("Outer.Inner")
    );
    assert!(schema.message("Outer.Inner").is_some());
    assert!(schema.message("Inner").is_some());
}

#[test]
fn enum_fields_resolve() {
    let raw = parse(
        r#"
enum Color {
  RED = 0;
  GREEN = 1;
}

message Pixel {
  Color color = 1 [default = GREEN];
}
"#,
    )
    .expect("parse");
    let schema = Schema::resolve(raw).expect("resolve");
    let color = schema.enum_type("Color").expect("Color");
    assert_eq!(color.number_by_name("GREEN"), Some(1));
    assert_eq!(color.name_by_number(0), Some("RED"));

    let pixel = schema.message("Pixel").expect("Pixel");
    let field = pixel.field_by_name("color").expect("color");
    assert_eq!(field.kind, FieldKind::Enum);
    assert_eq!(field.type_name.as_deref(), Some("Color"));
    assert_eq!(field.default, Some(DefaultValue::Enum(1)));
}

#[test]
fn scalar_defaults_are_coerced() {
    let raw = parse(
        r#"
message Defaults {
  int32 a = 1 [default = -5];
  uint64 b = 2 [default = 10];
  double c = 3 [default = 2.5];
  bool d = 4 [default = true];
  string e = 5 [default = "hi\n"];
}
"#,
    )
    .expect("parse");
    let schema = Schema::resolve(raw).expect("resolve");
    let m = schema.message("Defaults").expect("Defaults");
    assert_eq!(m.field_by_name("a").expect("a").default, Some(DefaultValue::Int32(-5)));
    assert_eq!(m.field_by_name("b").expect("b").default, Some(DefaultValue::UInt64(10)));
    assert_eq!(m.field_by_name("c").expect("c").default, Some(DefaultValue::Double(2.5)));
    assert_eq!(m.field_by_name("d").expect("d").default, Some(DefaultValue::Bool(true)));
    assert_eq!(
        m.field_by_name("e").expect("e").default,
        Some(DefaultValue::Str("hi\n".to_string()))
    );
}

#[test]
fn map_fields_lower_to_repeated_entries() {
    let raw = parse(
        r#"
message Person {
  map<string, int32> score_by_name = 1;
}
"#,
    )
    .expect("parse");
    let schema = Schema::resolve(raw).expect("resolve");
    let person = schema.message("Person").expect("Person");
    let field = person.field_by_name("score_by_name").expect("field");
    assert_eq!(field.kind, FieldKind::Message);
    assert_eq!(field.cardinality, Cardinality::Repeated);
    assert_eq!(field.type_name.as_deref(), Some("Person.ScoreByNameEntry"));

    let entry = schema.message("Person.ScoreByNameEntry").expect("entry");
    assert!(entry.map_entry);
    let key = entry.map_key_field().expect("key");
    let value = entry.map_value_field().expect("value");
    assert_eq!(key.name, "key");
    assert_eq!(key.kind, FieldKind::String);
    assert_eq!(value.name, "value");
    assert_eq!(value.kind, FieldKind::Int32);
}

#[test]
fn map_entry_names_are_camel_cased() {
    assert_eq!(map_entry_type_name("scores"), "ScoresEntry");
    assert_eq!(map_entry_type_name("score_by_name"), "ScoreByNameEntry");
    assert_eq!(map_entry_type_name("x"), "XEntry");
}

#[test]
fn duplicate_type_names_are_rejected() {
    let raw = parse("message A { int32 x = 1; }\nmessage A { int32 x = 1; }").expect("parse");
    match Schema::resolve(raw) {
        Err(SchemaError::DuplicateType(name)) => assert_eq!(name, "A"),
        other => panic!("expected DuplicateType, got {:?}", other),
    }
}

#[test]
fn duplicate_field_numbers_are_rejected() {
    let raw = parse("message A { int32 x = 1; int32 y = 1; }").expect("parse");
    match Schema::resolve(raw) {
        Err(SchemaError::DuplicateFieldNumber { message, number }) => {
            assert_eq!(message, "A");
            assert_eq!(number, 1);
        }
        other => panic!("expected DuplicateFieldNumber, got {:?}", other),
    }
}

#[test]
fn field_number_zero_is_rejected() {
    let raw = parse("message A { int32 x = 0; }").expect("parse");
    assert!(matches!(
        Schema::resolve(raw),
        Err(SchemaError::InvalidFieldNumber { .. })
    ));
}

#[test]
fn unresolved_type_reference_is_rejected() {
    let raw = parse("message A { Missing m = 1; }").expect("parse");
    match Schema::resolve(raw) {
        Err(SchemaError::UnresolvedType { type_name, field }) => {
            assert_eq!(type_name, "Missing");
            assert_eq!(field, "A.m");
        }
        other => panic!("expected UnresolvedType, got {:?}", other),
    }
}

#[test]
fn float_map_keys_are_rejected() {
    let raw = parse("message A { map<double, int32> m = 1; }").expect("parse");
    match Schema::resolve(raw) {
        Err(SchemaError::InvalidMapKey { kind, field }) => {
            assert_eq!(kind, "double");
            assert_eq!(field, "A.m");
        }
        other => panic!("expected InvalidMapKey, got {:?}", other),
    }
}

#[test]
fn mismatched_default_literal_is_rejected() {
    let raw = parse(r#"message A { int32 x = 1 [default = "nope"]; }"#).expect("parse");
    assert!(matches!(
        Schema::resolve(raw),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

#[test]
fn repeated_fields_take_no_default() {
    let raw = parse("message A { repeated int32 x = 1 [default = 3]; }").expect("parse");
    assert!(matches!(
        Schema::resolve(raw),
        Err(SchemaError::InvalidDefault { .. })
    ));
}

#[test]
fn empty_enum_is_rejected() {
    let raw = parse("enum E {}\nmessage A { int32 x = 1; }").expect("parse");
    assert!(matches!(Schema::resolve(raw), Err(SchemaError::EmptyEnum(_))));
}

#[test]
fn malformed_source_is_a_parse_error() {
    assert!(parse("message {").is_err());
    assert!(parse("message A { int32 = 1; }").is_err());
    assert!(parse("").is_ok());
}
