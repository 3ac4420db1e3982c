//! Format host values, messages and descriptors for display.

use crate::descriptor::{
    Cardinality, DefaultValue, EnumDescriptor, FieldDescriptor, MessageDescriptor,
};
use crate::host::{HostValue, MapKey};
use crate::message::DynamicMessage;

/// Raw scalar string (nil, numbers, quoted strings).
pub fn format_scalar(v: &HostValue) -> String {
    match v {
        HostValue::Nil => "nil".to_string(),
        HostValue::Int(x) => format!("{}", x),
        HostValue::UInt(x) => format!("{}", x),
        HostValue::Double(x) => format!("{}", x),
        HostValue::Float(x) => format!("{}", x),
        HostValue::Bool(x) => format!("{}", x),
        HostValue::Str(s) => format!("{:?}", s),
        _ => format!("{:?}", v),
    }
}

fn format_map_key(k: &MapKey) -> String {
    match k {
        MapKey::Bool(b) => format!("{}", b),
        MapKey::Int(i) => format!("{}", i),
        MapKey::UInt(u) => format!("{}", u),
        MapKey::Str(s) => format!("{:?}", s),
    }
}

/// Multi-line rendering of a host value.
pub fn host_value_to_dump(v: &HostValue, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        HostValue::Nil
        | HostValue::Int(_)
        | HostValue::UInt(_)
        | HostValue::Double(_)
        | HostValue::Float(_)
        | HostValue::Bool(_)
        | HostValue::Str(_) => format!("{}{}", pad, format_scalar(v)),
        HostValue::Message(m) => message_to_dump(m, indent),
        HostValue::Table(items) => {
            if items.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines = vec![format!("{}[", pad)];
            for (i, item) in items.iter().enumerate() {
                let sub = host_value_to_dump(item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        HostValue::Map(entries) => {
            if entries.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut lines = vec![format!("{}{{", pad)];
            for (k, val) in entries {
                let sub = host_value_to_dump(val, indent + 1);
                lines.push(format!(
                    "{}  {}: {}",
                    pad,
                    format_map_key(k),
                    sub.trim_start()
                ));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
    }
}

/// Render a message: fields in declaration order; singular scalars appear when
/// present or carrying a declared default, submessages when present, repeated
/// fields when non-empty.
pub fn message_to_dump(msg: &DynamicMessage, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let desc = msg.descriptor();
    let mut lines = vec![format!("{}{} {{", pad, desc.full_name)];
    for field in &desc.fields {
        if field.cardinality == Cardinality::Repeated {
            if msg.field_len(field) == 0 {
                continue;
            }
        } else if !msg.has_field(field) && field.default.is_none() {
            continue;
        }
        match crate::extract::get_message_field(msg, field) {
            Ok(v) => {
                let sub = host_value_to_dump(&v, indent + 1);
                lines.push(format!("{}  {}: {}", pad, field.name, sub.trim_start()));
            }
            Err(e) => lines.push(format!("{}  {}: <{}>", pad, field.name, e)),
        }
    }
    lines.push(format!("{}}}", pad));
    lines.join("\n")
}

fn format_default(d: &DefaultValue) -> String {
    match d {
        DefaultValue::Int32(v) => format!("{}", v),
        DefaultValue::Int64(v) => format!("{}", v),
        DefaultValue::UInt32(v) => format!("{}", v),
        DefaultValue::UInt64(v) => format!("{}", v),
        DefaultValue::Double(v) => format!("{}", v),
        DefaultValue::Float(v) => format!("{}", v),
        DefaultValue::Bool(v) => format!("{}", v),
        DefaultValue::Str(s) => format!("{:?}", s),
        DefaultValue::Enum(v) => format!("{}", v),
    }
}

fn field_type_label(field: &FieldDescriptor) -> String {
    match &field.type_name {
        Some(t) => t.clone(),
        None => field.kind.name().to_string(),
    }
}

/// One-block listing of a message descriptor for schema display.
pub fn message_descriptor_to_dump(desc: &MessageDescriptor) -> String {
    let head = if desc.map_entry {
        format!("message {} (map entry) {{", desc.full_name)
    } else {
        format!("message {} {{", desc.full_name)
    };
    let mut lines = vec![head];
    for field in &desc.fields {
        let label = match field.cardinality {
            Cardinality::Repeated => "repeated ",
            Cardinality::Singular => "",
        };
        let mut line = format!(
            "  {}{} {} = {}",
            label,
            field_type_label(field),
            field.name,
            field.number
        );
        if let Some(d) = &field.default {
            line.push_str(&format!(" [default = {}]", format_default(d)));
        }
        line.push(';');
        lines.push(line);
    }
    lines.push("}".to_string());
    lines.join("\n")
}

/// One-block listing of an enum descriptor.
pub fn enum_descriptor_to_dump(desc: &EnumDescriptor) -> String {
    let mut lines = vec![format!("enum {} {{", desc.full_name)];
    for (name, value) in &desc.variants {
        lines.push(format!("  {} = {};", name, value));
    }
    lines.push("}".to_string());
    lines.join("\n")
}
