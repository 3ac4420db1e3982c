//! Field extraction: read one message field through its descriptor and convert
//! it into a [`HostValue`] for the embedding runtime.
//!
//! Scalar fields always produce a value (default substitution for unset
//! fields); singular submessage fields produce nil when unset, else an opaque
//! handle owning a deep copy; repeated fields produce an ordered table; a
//! repeated field of map-entry submessages is decomposed into an associative
//! map keyed by the entry keys.

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::host::HostValue;
use crate::message::{DynamicMessage, FieldValue};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The field is not reflectively resolvable on the message's type.
    #[error("message {type_name} has no reflection for field {field}")]
    NoReflection { type_name: String, field: String },
    /// Declared kind outside the nine scalar kinds and submessage.
    #[error("unsupported field type {kind} of {field}")]
    UnsupportedType { kind: &'static str, field: String },
    /// A map-entry type without its key or value field.
    #[error("map entry type {type_name} has no {part} field")]
    MalformedMapEntry { type_name: String, part: &'static str },
    /// A map key whose kind cannot index an associative host value.
    #[error("unsupported map key type {kind} of {field}")]
    UnsupportedMapKey { kind: &'static str, field: String },
}

fn unsupported(field: &FieldDescriptor) -> ExtractError {
    ExtractError::UnsupportedType {
        kind: field.kind.name(),
        field: field.full_name.clone(),
    }
}

/// Wrap a deep copy of `msg` as a host handle. The copy owns all of its
/// storage; later mutation of the source never shows through.
fn message_handle(msg: &DynamicMessage) -> HostValue {
    HostValue::Message(Rc::new(msg.clone()))
}

/// Extract one field of `msg` as a host value.
///
/// Singular scalars always yield a value (protobuf default substitution for
/// unset fields, enums as their underlying number); a singular submessage
/// yields nil when unset; repeated fields delegate to [`get_repeated_field`].
pub fn get_message_field(
    msg: &DynamicMessage,
    field: &FieldDescriptor,
) -> Result<HostValue, ExtractError> {
    if !msg.can_reflect(field) {
        return Err(ExtractError::NoReflection {
            type_name: msg.type_name().to_string(),
            field: field.full_name.clone(),
        });
    }

    if field.is_repeated() {
        return get_repeated_field(msg, field);
    }

    match field.kind {
        // Scalar fields always have a value.
        FieldKind::Int32 => Ok(HostValue::Int(msg.get_i32(field) as i64)),
        FieldKind::Int64 => Ok(HostValue::Int(msg.get_i64(field))),
        FieldKind::UInt32 => Ok(HostValue::UInt(msg.get_u32(field) as u64)),
        FieldKind::UInt64 => Ok(HostValue::UInt(msg.get_u64(field))),
        FieldKind::Double => Ok(HostValue::Double(msg.get_f64(field))),
        FieldKind::Float => Ok(HostValue::Float(msg.get_f32(field))),
        FieldKind::Bool => Ok(HostValue::Bool(msg.get_bool(field))),
        FieldKind::Enum => Ok(HostValue::Int(msg.get_enum_value(field) as i64)),
        FieldKind::String => Ok(HostValue::Str(msg.get_str(field).to_string())),
        // Message fields have no default value: unset reads as nil.
        FieldKind::Message => Ok(match msg.get_message(field) {
            Some(sub) => message_handle(sub),
            None => HostValue::Nil,
        }),
        FieldKind::Group => Err(unsupported(field)),
    }
}

/// Extract a repeated field as an ordered table of exactly `field_len` entries,
/// or as an associative map when the element type is a map entry. Errors abort
/// the whole call; no partial result escapes.
pub fn get_repeated_field(
    msg: &DynamicMessage,
    field: &FieldDescriptor,
) -> Result<HostValue, ExtractError> {
    if !msg.can_reflect(field) {
        return Err(ExtractError::NoReflection {
            type_name: msg.type_name().to_string(),
            field: field.full_name.clone(),
        });
    }
    if !field.kind.is_scalar() && field.kind != FieldKind::Message {
        return Err(unsupported(field));
    }

    let elements = msg.repeated(field);

    // Map-ness is a property of the element type; an empty map field is
    // indistinguishable from an empty list and yields an empty table.
    if let Some(FieldValue::Message(first)) = elements.first() {
        if first.descriptor().map_entry {
            return map_from_entries(field, elements);
        }
    }

    let mut table = Vec::with_capacity(elements.len());
    for elem in elements {
        table.push(element_value(elem));
    }
    Ok(HostValue::Table(table))
}

/// Convert one repeated element. Storage kinds are maintained by the message's
/// checked setters, so every stored element is convertible.
fn element_value(elem: &FieldValue) -> HostValue {
    match elem {
        FieldValue::Int32(v) => HostValue::Int(*v as i64),
        FieldValue::Int64(v) => HostValue::Int(*v),
        FieldValue::UInt32(v) => HostValue::UInt(*v as u64),
        FieldValue::UInt64(v) => HostValue::UInt(*v),
        FieldValue::Double(v) => HostValue::Double(*v),
        FieldValue::Float(v) => HostValue::Float(*v),
        FieldValue::Bool(v) => HostValue::Bool(*v),
        FieldValue::Enum(v) => HostValue::Int(*v as i64),
        FieldValue::Str(v) => HostValue::Str(v.clone()),
        FieldValue::Message(m) => message_handle(m),
    }
}

/// Decompose map-entry elements into a single associative value. Entries with
/// equal keys overwrite in order, matching protobuf map semantics.
fn map_from_entries(
    field: &FieldDescriptor,
    entries: &[FieldValue],
) -> Result<HostValue, ExtractError> {
    let mut map = BTreeMap::new();
    for elem in entries {
        let entry = match elem {
            FieldValue::Message(m) => m,
            // A non-message element under a message field cannot be stored.
            _ => return Err(unsupported(field)),
        };
        let desc = entry.descriptor();
        let key_field = desc
            .map_key_field()
            .ok_or_else(|| ExtractError::MalformedMapEntry {
                type_name: desc.full_name.clone(),
                part: "key",
            })?;
        let value_field = desc
            .map_value_field()
            .ok_or_else(|| ExtractError::MalformedMapEntry {
                type_name: desc.full_name.clone(),
                part: "value",
            })?;
        let key = get_message_field(entry, key_field)?;
        let key = key
            .as_map_key()
            .ok_or_else(|| ExtractError::UnsupportedMapKey {
                kind: key_field.kind.name(),
                field: field.full_name.clone(),
            })?;
        let value = get_message_field(entry, value_field)?;
        map.insert(key, value);
    }
    Ok(HostValue::Map(map))
}
