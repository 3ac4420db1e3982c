//! End to end: parse a schema, build messages, extract host values, render
//! dumps, and exercise the checked mutation surface.

use pbhost::dump::{host_value_to_dump, message_descriptor_to_dump, message_to_dump};
use pbhost::message::MessageError;
use pbhost::{get_message_field, parse, DynamicMessage, FieldValue, HostValue, Schema};
use std::io::Write;

const ADDRESS_BOOK: &str = r#"
syntax = "proto3";

enum Kind {
  HOME = 0;
  WORK = 1;
}

message Point {
  int32 x = 1;
  int32 y = 2;
}

message Person {
  string name = 1;
  Point addr = 2;
  Kind kind = 3;
  repeated string tags = 4;
  repeated Point waypoints = 5;
  map<string, int32> scores = 6;
}
"#;

fn schema() -> Schema {
    Schema::resolve(parse(ADDRESS_BOOK).expect("parse")).expect("resolve")
}

fn person_with_everything(schema: &Schema) -> DynamicMessage {
    let mut addr = DynamicMessage::new(schema.message("Point").expect("Point").clone());
    addr.set_by_name("x", FieldValue::Int32(3)).expect("set");
    addr.set_by_name("y", FieldValue::Int32(4)).expect("set");

    let mut person = DynamicMessage::new(schema.message("Person").expect("Person").clone());
    person.set_by_name("name", FieldValue::Str("ada".to_string())).expect("set");
    person.set_by_name("addr", FieldValue::Message(addr)).expect("set");
    person.set_by_name("kind", FieldValue::Enum(1)).expect("set");
    for tag in ["a", "b"] {
        person.push_by_name("tags", FieldValue::Str(tag.to_string())).expect("push");
    }

    let entry_desc = schema.message("Person.ScoresEntry").expect("entry").clone();
    let mut entry = DynamicMessage::new(entry_desc);
    entry.set_by_name("key", FieldValue::Str("alice".to_string())).expect("key");
    entry.set_by_name("value", FieldValue::Int32(10)).expect("value");
    person.push_by_name("scores", FieldValue::Message(entry)).expect("push");
    person
}

#[test]
fn whole_message_extracts_field_by_field() {
    let schema = schema();
    let person = person_with_everything(&schema);
    let desc = person.descriptor().clone();

    let mut extracted = Vec::new();
    for field in &desc.fields {
        extracted.push((field.name.clone(), get_message_field(&person, field).expect("extract")));
    }

    assert_eq!(extracted[0].1, HostValue::Str("ada".to_string()));
    assert!(extracted[1].1.as_message().is_some());
    assert_eq!(extracted[2].1, HostValue::Int(1));
    assert_eq!(extracted[3].1.as_table().expect("tags").len(), 2);
    assert_eq!(extracted[4].1.as_table().expect("waypoints").len(), 0);
    assert_eq!(extracted[5].1.as_map().expect("scores").len(), 1);
}

#[test]
fn dump_renders_present_fields_only() {
    let schema = schema();
    let person = person_with_everything(&schema);
    let text = message_to_dump(&person, 0);

    assert!(text.starts_with("Person {"));
    assert!(text.contains("name: \"ada\""));
    assert!(text.contains("addr: Point {"));
    assert!(text.contains("x: 3"));
    assert!(text.contains("kind: 1"));
    assert!(text.contains("[0] \"a\""));
    assert!(text.contains("[1] \"b\""));
    assert!(text.contains("\"alice\": 10"));
    // Empty repeated fields are omitted.
    assert!(!text.contains("waypoints"));

    let fresh = DynamicMessage::new(schema.message("Person").expect("Person").clone());
    let text = message_to_dump(&fresh, 0);
    assert!(!text.contains("name"));
}

#[test]
fn host_value_dump_shapes() {
    assert_eq!(host_value_to_dump(&HostValue::Nil, 0), "nil");
    assert_eq!(host_value_to_dump(&HostValue::Str("x".to_string()), 0), "\"x\"");
    assert_eq!(host_value_to_dump(&HostValue::Table(Vec::new()), 0), "[]");
    let table = HostValue::Table(vec![HostValue::Int(1), HostValue::Int(2)]);
    assert_eq!(host_value_to_dump(&table, 0), "[\n  [0] 1\n  [1] 2\n]");
}

#[test]
fn descriptor_dump_shows_lowered_maps() {
    let schema = schema();
    let person = schema.message("Person").expect("Person");
    let text = message_descriptor_to_dump(person);
    assert!(text.contains("repeated Person.ScoresEntry scores = 6;"));

    let entry = schema.message("Person.ScoresEntry").expect("entry");
    let text = message_descriptor_to_dump(entry);
    assert!(text.starts_with("message Person.ScoresEntry (map entry) {"));
    assert!(text.contains("string key = 1;"));
    assert!(text.contains("int32 value = 2;"));
}

#[test]
fn schema_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(ADDRESS_BOOK.as_bytes()).expect("write");
    let source = std::fs::read_to_string(file.path()).expect("read");
    let schema = Schema::resolve(parse(&source).expect("parse")).expect("resolve");
    assert!(schema.message("Person").is_some());
}

#[test]
fn checked_mutation_rejects_mismatches() {
    let schema = schema();
    let mut person = DynamicMessage::new(schema.message("Person").expect("Person").clone());

    // Wrong value kind.
    assert!(matches!(
        person.set_by_name("name", FieldValue::Int32(1)),
        Err(MessageError::WrongKind(_))
    ));
    // Singular set on a repeated field.
    assert!(matches!(
        person.set_by_name("tags", FieldValue::Str("x".to_string())),
        Err(MessageError::IsRepeated(_))
    ));
    // Push on a singular field.
    assert!(matches!(
        person.push_by_name("name", FieldValue::Str("x".to_string())),
        Err(MessageError::NotRepeated(_))
    ));
    // Unknown field name.
    assert!(matches!(
        person.set_by_name("nope", FieldValue::Int32(1)),
        Err(MessageError::NoSuchField { .. })
    ));
    // Field descriptor from another type.
    let point_desc = schema.message("Point").expect("Point").clone();
    let x = point_desc.field_by_name("x").expect("x");
    assert!(matches!(
        person.set_field(x, FieldValue::Int32(1)),
        Err(MessageError::ForeignField { .. })
    ));
    // Submessage type: the matching concrete type is accepted, any other
    // message type is a kind mismatch.
    let other = DynamicMessage::new(point_desc.clone());
    assert!(matches!(
        person.set_by_name("addr", FieldValue::Message(other)),
        Ok(())
    ));
    let person_msg = DynamicMessage::new(schema.message("Person").expect("Person").clone());
    let mut outer = DynamicMessage::new(schema.message("Person").expect("Person").clone());
    assert!(matches!(
        outer.set_by_name("addr", FieldValue::Message(person_msg)),
        Err(MessageError::WrongKind(_))
    ));
}
