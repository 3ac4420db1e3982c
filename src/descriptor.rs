//! Descriptor model: static per-field metadata shared by all instances of a message type,
//! plus the raw schema AST and its resolution into a [`Schema`] registry.

use std::collections::HashMap;
use std::sync::Arc;

/// Declared kind of a field. The nine scalar kinds plus submessage are the
/// extractable set; `Group` (deprecated proto2 groups) is representable in a
/// descriptor but rejected by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Double,
    Float,
    Bool,
    Enum,
    String,
    Message,
    Group,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Enum => "enum",
            FieldKind::String => "string",
            FieldKind::Message => "message",
            FieldKind::Group => "group",
        }
    }

    /// True for the nine scalar kinds (everything except submessage and group).
    pub fn is_scalar(self) -> bool {
        !matches!(self, FieldKind::Message | FieldKind::Group)
    }

    /// Kinds allowed as a map key.
    pub fn is_valid_map_key(self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::UInt32
                | FieldKind::UInt64
                | FieldKind::Bool
                | FieldKind::String
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// Declared default for a singular scalar field, already coerced to the field's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Double(f64),
    Float(f32),
    Bool(bool),
    Str(String),
    Enum(i32),
}

/// Static metadata for one field of a message type. Immutable once resolved and
/// shared by all instances of the containing type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// Qualified as `ContainingType.field`.
    pub full_name: String,
    pub number: u32,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
    /// Full name of the referenced message or enum type for `Message`/`Enum`/`Group` kinds.
    pub type_name: Option<String>,
    pub default: Option<DefaultValue>,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

/// Static metadata for a message type: ordered fields with by-name and by-number lookup.
#[derive(Debug)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Set on synthetic key/value entry types lowered from `map<K, V>` fields.
    pub map_entry: bool,
    fields_by_name: HashMap<String, usize>,
    fields_by_number: HashMap<u32, usize>,
}

impl MessageDescriptor {
    pub fn new(
        name: String,
        full_name: String,
        fields: Vec<FieldDescriptor>,
        map_entry: bool,
    ) -> Result<Self, SchemaError> {
        let mut fields_by_name = HashMap::new();
        let mut fields_by_number = HashMap::new();
        for (i, f) in fields.iter().enumerate() {
            if f.number == 0 {
                return Err(SchemaError::InvalidFieldNumber {
                    field: f.full_name.clone(),
                    number: f.number,
                });
            }
            if fields_by_name.insert(f.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateFieldName {
                    message: full_name.clone(),
                    name: f.name.clone(),
                });
            }
            if fields_by_number.insert(f.number, i).is_some() {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: full_name.clone(),
                    number: f.number,
                });
            }
        }
        Ok(MessageDescriptor {
            name,
            full_name,
            fields,
            map_entry,
            fields_by_name,
            fields_by_number,
        })
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields_by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields_by_number.get(&number).map(|&i| &self.fields[i])
    }

    /// Key field of a map-entry type (field number 1).
    pub fn map_key_field(&self) -> Option<&FieldDescriptor> {
        self.field_by_number(1)
    }

    /// Value field of a map-entry type (field number 2).
    pub fn map_value_field(&self) -> Option<&FieldDescriptor> {
        self.field_by_number(2)
    }
}

/// Static metadata for an enum type. Values are plain numbers at runtime.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    /// Declaration order.
    pub variants: Vec<(String, i32)>,
}

impl EnumDescriptor {
    pub fn number_by_name(&self, name: &str) -> Option<i32> {
        self.variants
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    pub fn name_by_number(&self, number: i32) -> Option<&str> {
        self.variants
            .iter()
            .find(|&&(_, v)| v == number)
            .map(|(n, _)| n.as_str())
    }
}

// ==================== Raw schema AST (parser output) ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Bare identifier (enum variant reference in a default option).
    Ident(String),
}

#[derive(Debug, Clone)]
pub enum RawTypeRef {
    Scalar(FieldKind),
    Named(String),
    Map {
        key: FieldKind,
        value: Box<RawTypeRef>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLabel {
    Optional,
    Repeated,
}

#[derive(Debug, Clone)]
pub struct RawField {
    pub name: String,
    pub number: u32,
    pub label: Option<RawLabel>,
    pub type_ref: RawTypeRef,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone)]
pub struct RawMessage {
    pub name: String,
    pub fields: Vec<RawField>,
    pub nested: Vec<RawMessage>,
    pub enums: Vec<RawEnum>,
}

#[derive(Debug, Clone)]
pub struct RawEnum {
    pub name: String,
    pub variants: Vec<(String, i64)>,
}

/// Parsed schema file before resolution.
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub messages: Vec<RawMessage>,
    pub enums: Vec<RawEnum>,
}

// ==================== Resolution ====================

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate type name: {0}")]
    DuplicateType(String),
    #[error("duplicate field name {name} in {message}")]
    DuplicateFieldName { message: String, name: String },
    #[error("duplicate field number {number} in {message}")]
    DuplicateFieldNumber { message: String, number: u32 },
    #[error("invalid field number {number} for {field}")]
    InvalidFieldNumber { field: String, number: u32 },
    #[error("unresolved type {type_name} for field {field}")]
    UnresolvedType { type_name: String, field: String },
    #[error("invalid map key type {kind} for field {field}")]
    InvalidMapKey { kind: &'static str, field: String },
    #[error("invalid map field {field}: {reason}")]
    InvalidMapField { field: String, reason: String },
    #[error("invalid default for field {field}: {reason}")]
    InvalidDefault { field: String, reason: String },
    #[error("enum {0} has no variants")]
    EmptyEnum(String),
}

/// Resolved type registry: message and enum descriptors by full name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl Schema {
    /// Resolve a parsed schema: flatten nesting, lower map fields to repeated
    /// map-entry submessages, resolve type references, and coerce defaults.
    pub fn resolve(raw: RawSchema) -> Result<Self, SchemaError> {
        let mut schema = Schema::default();

        // Pass 1: collect all type names (including nested and synthetic map
        // entries) so field references can be resolved in pass 2.
        let mut flat_messages: Vec<FlatMessage> = Vec::new();
        let mut names: HashMap<String, TypeTag> = HashMap::new();
        for e in &raw.enums {
            schema.insert_enum(resolve_enum(e, None)?, &mut names)?;
        }
        for m in &raw.messages {
            flatten_message(m, None, &mut flat_messages, &mut schema, &mut names)?;
        }
        for fm in &flat_messages {
            register_name(&mut names, fm.full_name.clone(), TypeTag::Message)?;
            for f in &fm.fields {
                if let RawTypeRef::Map { .. } = f.type_ref {
                    let entry = map_entry_full_name(&fm.full_name, &f.name);
                    register_name(&mut names, entry, TypeTag::Message)?;
                }
            }
        }

        // Pass 2: build descriptors.
        let mut pending: Vec<MessageDescriptor> = Vec::new();
        for fm in &flat_messages {
            let mut fields = Vec::new();
            for f in &fm.fields {
                match &f.type_ref {
                    RawTypeRef::Map { key, value } => {
                        let entry_full = map_entry_full_name(&fm.full_name, &f.name);
                        let entry =
                            build_map_entry(&entry_full, *key, value, &fm.full_name, f, &names)?;
                        pending.push(entry);
                        fields.push(FieldDescriptor {
                            name: f.name.clone(),
                            full_name: format!("{}.{}", fm.full_name, f.name),
                            number: f.number,
                            kind: FieldKind::Message,
                            cardinality: Cardinality::Repeated,
                            type_name: Some(entry_full),
                            default: None,
                        });
                    }
                    _ => fields.push(build_field(fm, f, &names, &schema)?),
                }
            }
            pending.push(MessageDescriptor::new(
                fm.name.clone(),
                fm.full_name.clone(),
                fields,
                false,
            )?);
        }
        for desc in pending {
            schema
                .messages
                .insert(desc.full_name.clone(), Arc::new(desc));
        }
        Ok(schema)
    }

    pub fn message(&self, full_name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(full_name)
    }

    pub fn enum_type(&self, full_name: &str) -> Option<&Arc<EnumDescriptor>> {
        self.enums.get(full_name)
    }

    /// All message full names, sorted (stable listing for display).
    pub fn message_names(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        v.sort();
        v
    }

    pub fn enum_names(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.enums.keys().map(String::as_str).collect();
        v.sort();
        v
    }

    fn insert_enum(
        &mut self,
        e: EnumDescriptor,
        names: &mut HashMap<String, TypeTag>,
    ) -> Result<(), SchemaError> {
        register_name(names, e.full_name.clone(), TypeTag::Enum)?;
        self.enums.insert(e.full_name.clone(), Arc::new(e));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeTag {
    Message,
    Enum,
}

struct FlatMessage {
    name: String,
    full_name: String,
    /// Enclosing type full names, innermost last. Used for reference resolution.
    scope: Vec<String>,
    fields: Vec<RawField>,
}

fn register_name(
    names: &mut HashMap<String, TypeTag>,
    full_name: String,
    tag: TypeTag,
) -> Result<(), SchemaError> {
    if names.insert(full_name.clone(), tag).is_some() {
        return Err(SchemaError::DuplicateType(full_name));
    }
    Ok(())
}

fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(s) => format!("{}.{}", s, name),
        None => name.to_string(),
    }
}

fn flatten_message(
    m: &RawMessage,
    scope: Option<&str>,
    out: &mut Vec<FlatMessage>,
    schema: &mut Schema,
    names: &mut HashMap<String, TypeTag>,
) -> Result<(), SchemaError> {
    let full_name = qualify(scope, &m.name);
    out.push(FlatMessage {
        name: m.name.clone(),
        full_name: full_name.clone(),
        scope: scope_chain(&full_name),
        fields: m.fields.clone(),
    });
    for e in &m.enums {
        schema.insert_enum(resolve_enum(e, Some(&full_name))?, names)?;
    }
    for nested in &m.nested {
        flatten_message(nested, Some(&full_name), out, schema, names)?;
    }
    Ok(())
}

fn resolve_enum(e: &RawEnum, scope: Option<&str>) -> Result<EnumDescriptor, SchemaError> {
    let full_name = qualify(scope, &e.name);
    if e.variants.is_empty() {
        return Err(SchemaError::EmptyEnum(full_name));
    }
    let variants = e
        .variants
        .iter()
        .map(|(n, v)| (n.clone(), *v as i32))
        .collect();
    Ok(EnumDescriptor {
        name: e.name.clone(),
        full_name,
        variants,
    })
}

/// Resolve a bare type reference against the enclosing scopes, innermost first,
/// then at file scope.
fn lookup_named(
    name: &str,
    scopes: &[String],
    names: &HashMap<String, TypeTag>,
) -> Option<(String, TypeTag)> {
    for scope in scopes.iter().rev() {
        let candidate = format!("{}.{}", scope, name);
        if let Some(&tag) = names.get(&candidate) {
            return Some((candidate, tag));
        }
    }
    names.get(name).map(|&tag| (name.to_string(), tag))
}

fn build_field(
    fm: &FlatMessage,
    f: &RawField,
    names: &HashMap<String, TypeTag>,
    schema: &Schema,
) -> Result<FieldDescriptor, SchemaError> {
    let full_name = format!("{}.{}", fm.full_name, f.name);
    let cardinality = match f.label {
        Some(RawLabel::Repeated) => Cardinality::Repeated,
        _ => Cardinality::Singular,
    };
    let (kind, type_name) = match &f.type_ref {
        RawTypeRef::Scalar(k) => (*k, None),
        RawTypeRef::Named(n) => {
            let (resolved, tag) = lookup_named(n, &fm.scope, names).ok_or_else(|| {
                SchemaError::UnresolvedType {
                    type_name: n.clone(),
                    field: full_name.clone(),
                }
            })?;
            let kind = match tag {
                TypeTag::Message => FieldKind::Message,
                TypeTag::Enum => FieldKind::Enum,
            };
            (kind, Some(resolved))
        }
        RawTypeRef::Map { .. } => unreachable!("map fields are lowered by the caller"),
    };
    let default = match &f.default {
        Some(lit) => Some(coerce_default(
            lit,
            kind,
            type_name.as_deref(),
            &full_name,
            cardinality,
            schema,
        )?),
        None => None,
    };
    Ok(FieldDescriptor {
        name: f.name.clone(),
        full_name,
        number: f.number,
        kind,
        cardinality,
        type_name,
        default,
    })
}

/// Synthetic entry type name for a map field, protobuf style: the field name
/// converted to CamelCase with an `Entry` suffix, nested under the message.
pub fn map_entry_type_name(field_name: &str) -> String {
    let mut out = String::new();
    let mut upper_next = true;
    for c in field_name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out.push_str("Entry");
    out
}

fn map_entry_full_name(message_full_name: &str, field_name: &str) -> String {
    format!("{}.{}", message_full_name, map_entry_type_name(field_name))
}

fn build_map_entry(
    entry_full: &str,
    key: FieldKind,
    value: &RawTypeRef,
    message_full_name: &str,
    f: &RawField,
    names: &HashMap<String, TypeTag>,
) -> Result<MessageDescriptor, SchemaError> {
    let field_full = format!("{}.{}", message_full_name, f.name);
    if !key.is_valid_map_key() {
        return Err(SchemaError::InvalidMapKey {
            kind: key.name(),
            field: field_full,
        });
    }
    if f.label.is_some() {
        return Err(SchemaError::InvalidMapField {
            field: field_full,
            reason: "map fields take no label".to_string(),
        });
    }
    let (value_kind, value_type_name) = match value {
        RawTypeRef::Scalar(k) => (*k, None),
        RawTypeRef::Named(n) => {
            // Map values resolve in the containing message's scope.
            let scopes = scope_chain(message_full_name);
            let (resolved, tag) = lookup_named(n, &scopes, names).ok_or_else(|| {
                SchemaError::UnresolvedType {
                    type_name: n.clone(),
                    field: field_full.clone(),
                }
            })?;
            let kind = match tag {
                TypeTag::Message => FieldKind::Message,
                TypeTag::Enum => FieldKind::Enum,
            };
            (kind, Some(resolved))
        }
        RawTypeRef::Map { .. } => {
            return Err(SchemaError::InvalidMapField {
                field: field_full,
                reason: "map values cannot be maps".to_string(),
            })
        }
    };
    let key_field = FieldDescriptor {
        name: "key".to_string(),
        full_name: format!("{}.key", entry_full),
        number: 1,
        kind: key,
        cardinality: Cardinality::Singular,
        type_name: None,
        default: None,
    };
    let value_field = FieldDescriptor {
        name: "value".to_string(),
        full_name: format!("{}.value", entry_full),
        number: 2,
        kind: value_kind,
        cardinality: Cardinality::Singular,
        type_name: value_type_name,
        default: None,
    };
    let name = entry_full.rsplit('.').next().unwrap_or(entry_full).to_string();
    MessageDescriptor::new(name, entry_full.to_string(), vec![key_field, value_field], true)
}

fn scope_chain(full_name: &str) -> Vec<String> {
    let mut scopes = Vec::new();
    let mut acc = String::new();
    for part in full_name.split('.') {
        if !acc.is_empty() {
            acc.push('.');
        }
        acc.push_str(part);
        scopes.push(acc.clone());
    }
    scopes
}

fn coerce_default(
    lit: &Literal,
    kind: FieldKind,
    type_name: Option<&str>,
    field: &str,
    cardinality: Cardinality,
    schema: &Schema,
) -> Result<DefaultValue, SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidDefault {
        field: field.to_string(),
        reason: reason.to_string(),
    };
    if cardinality == Cardinality::Repeated {
        return Err(invalid("repeated fields take no default"));
    }
    match (kind, lit) {
        (FieldKind::Int32, Literal::Int(i)) => i32::try_from(*i)
            .map(DefaultValue::Int32)
            .map_err(|_| invalid("out of int32 range")),
        (FieldKind::Int64, Literal::Int(i)) => Ok(DefaultValue::Int64(*i)),
        (FieldKind::UInt32, Literal::Int(i)) => u32::try_from(*i)
            .map(DefaultValue::UInt32)
            .map_err(|_| invalid("out of uint32 range")),
        (FieldKind::UInt64, Literal::Int(i)) => u64::try_from(*i)
            .map(DefaultValue::UInt64)
            .map_err(|_| invalid("out of uint64 range")),
        (FieldKind::Double, Literal::Float(x)) => Ok(DefaultValue::Double(*x)),
        (FieldKind::Double, Literal::Int(i)) => Ok(DefaultValue::Double(*i as f64)),
        (FieldKind::Float, Literal::Float(x)) => Ok(DefaultValue::Float(*x as f32)),
        (FieldKind::Float, Literal::Int(i)) => Ok(DefaultValue::Float(*i as f32)),
        (FieldKind::Bool, Literal::Bool(b)) => Ok(DefaultValue::Bool(*b)),
        (FieldKind::String, Literal::Str(s)) => Ok(DefaultValue::Str(s.clone())),
        (FieldKind::Enum, Literal::Ident(variant)) => {
            let type_name = type_name.ok_or_else(|| invalid("enum field without type"))?;
            let e = schema
                .enum_type(type_name)
                .ok_or_else(|| invalid("enum type not yet resolved"))?;
            e.number_by_name(variant)
                .map(DefaultValue::Enum)
                .ok_or_else(|| invalid("no such enum variant"))
        }
        (FieldKind::Message, _) | (FieldKind::Group, _) => {
            Err(invalid("message fields take no default"))
        }
        _ => Err(invalid("literal does not match field kind")),
    }
}
