//! Dynamic messages: descriptor-typed field storage with a reflection-style
//! access surface (presence tests, default-substituting getters, indexed
//! repeated access, checked mutation).

use crate::descriptor::{Cardinality, DefaultValue, FieldDescriptor, FieldKind, MessageDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One stored value. The kind always matches the owning field's descriptor;
/// the checked setters maintain that invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Double(f64),
    Float(f32),
    Bool(bool),
    Enum(i32),
    Str(String),
    Message(DynamicMessage),
}

impl FieldValue {
    fn matches(&self, field: &FieldDescriptor) -> bool {
        match (self, field.kind) {
            (FieldValue::Int32(_), FieldKind::Int32) => true,
            (FieldValue::Int64(_), FieldKind::Int64) => true,
            (FieldValue::UInt32(_), FieldKind::UInt32) => true,
            (FieldValue::UInt64(_), FieldKind::UInt64) => true,
            (FieldValue::Double(_), FieldKind::Double) => true,
            (FieldValue::Float(_), FieldKind::Float) => true,
            (FieldValue::Bool(_), FieldKind::Bool) => true,
            (FieldValue::Enum(_), FieldKind::Enum) => true,
            (FieldValue::Str(_), FieldKind::String) => true,
            (FieldValue::Message(m), FieldKind::Message) => {
                field.type_name.as_deref() == Some(m.type_name())
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldSlot {
    Single(FieldValue),
    Repeated(Vec<FieldValue>),
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("field {field} does not belong to message type {message}")]
    ForeignField { message: String, field: String },
    #[error("no field named {name} in message type {message}")]
    NoSuchField { message: String, name: String },
    #[error("value kind does not match field {0}")]
    WrongKind(String),
    #[error("field {0} is repeated; use push")]
    IsRepeated(String),
    #[error("field {0} is singular; use set")]
    NotRepeated(String),
}

/// A message instance typed by its descriptor. `Clone` is a deep copy: the
/// duplicate shares no mutable storage with the source.
#[derive(Debug, Clone)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    slots: BTreeMap<u32, FieldSlot>,
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.full_name == other.descriptor.full_name && self.slots == other.slots
    }
}

impl DynamicMessage {
    /// Fresh instance with every field unset.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        DynamicMessage {
            descriptor,
            slots: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.full_name
    }

    /// True if the given descriptor is a field of this message's type, i.e.
    /// reflective access through it is possible.
    pub fn can_reflect(&self, field: &FieldDescriptor) -> bool {
        self.descriptor
            .field_by_number(field.number)
            .map(|own| own.full_name == field.full_name)
            .unwrap_or(false)
    }

    fn check(&self, field: &FieldDescriptor) -> Result<(), MessageError> {
        if self.can_reflect(field) {
            Ok(())
        } else {
            Err(MessageError::ForeignField {
                message: self.type_name().to_string(),
                field: field.full_name.clone(),
            })
        }
    }

    /// Presence of a singular field; for repeated fields, true when non-empty.
    pub fn has_field(&self, field: &FieldDescriptor) -> bool {
        match self.slots.get(&field.number) {
            Some(FieldSlot::Single(_)) => true,
            Some(FieldSlot::Repeated(v)) => !v.is_empty(),
            None => false,
        }
    }

    /// Element count of a repeated field (0 when unset or singular).
    pub fn field_len(&self, field: &FieldDescriptor) -> usize {
        match self.slots.get(&field.number) {
            Some(FieldSlot::Repeated(v)) => v.len(),
            _ => 0,
        }
    }

    /// Elements of a repeated field in insertion order (empty when unset).
    pub fn repeated(&self, field: &FieldDescriptor) -> &[FieldValue] {
        match self.slots.get(&field.number) {
            Some(FieldSlot::Repeated(v)) => v,
            _ => &[],
        }
    }

    pub fn get_repeated(&self, field: &FieldDescriptor, index: usize) -> Option<&FieldValue> {
        self.repeated(field).get(index)
    }

    /// Raw stored value of a singular field, without default substitution.
    pub fn get_single(&self, field: &FieldDescriptor) -> Option<&FieldValue> {
        match self.slots.get(&field.number) {
            Some(FieldSlot::Single(v)) => Some(v),
            _ => None,
        }
    }

    pub fn clear_field(&mut self, field: &FieldDescriptor) {
        self.slots.remove(&field.number);
    }

    /// Set a singular field. The value kind must match the descriptor.
    pub fn set_field(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
    ) -> Result<(), MessageError> {
        self.check(field)?;
        if field.cardinality == Cardinality::Repeated {
            return Err(MessageError::IsRepeated(field.full_name.clone()));
        }
        if !value.matches(field) {
            return Err(MessageError::WrongKind(field.full_name.clone()));
        }
        self.slots.insert(field.number, FieldSlot::Single(value));
        Ok(())
    }

    /// Append to a repeated field. The value kind must match the descriptor.
    pub fn push_field(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
    ) -> Result<(), MessageError> {
        self.check(field)?;
        if field.cardinality != Cardinality::Repeated {
            return Err(MessageError::NotRepeated(field.full_name.clone()));
        }
        if !value.matches(field) {
            return Err(MessageError::WrongKind(field.full_name.clone()));
        }
        match self
            .slots
            .entry(field.number)
            .or_insert_with(|| FieldSlot::Repeated(Vec::new()))
        {
            FieldSlot::Repeated(v) => v.push(value),
            FieldSlot::Single(_) => unreachable!("singular slot under repeated field"),
        }
        Ok(())
    }

    /// Set a singular field by name.
    pub fn set_by_name(&mut self, name: &str, value: FieldValue) -> Result<(), MessageError> {
        let desc = self.descriptor.clone();
        let field = desc.field_by_name(name).ok_or_else(|| MessageError::NoSuchField {
            message: self.type_name().to_string(),
            name: name.to_string(),
        })?;
        self.set_field(field, value)
    }

    /// Append to a repeated field by name.
    pub fn push_by_name(&mut self, name: &str, value: FieldValue) -> Result<(), MessageError> {
        let desc = self.descriptor.clone();
        let field = desc.field_by_name(name).ok_or_else(|| MessageError::NoSuchField {
            message: self.type_name().to_string(),
            name: name.to_string(),
        })?;
        self.push_field(field, value)
    }

    // Singular getters. Unset scalar fields read as the declared default, else
    // the kind's zero/empty/false.

    pub fn get_i32(&self, field: &FieldDescriptor) -> i32 {
        match self.get_single(field) {
            Some(FieldValue::Int32(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::Int32(v)) => *v,
                _ => 0,
            },
        }
    }

    pub fn get_i64(&self, field: &FieldDescriptor) -> i64 {
        match self.get_single(field) {
            Some(FieldValue::Int64(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::Int64(v)) => *v,
                _ => 0,
            },
        }
    }

    pub fn get_u32(&self, field: &FieldDescriptor) -> u32 {
        match self.get_single(field) {
            Some(FieldValue::UInt32(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::UInt32(v)) => *v,
                _ => 0,
            },
        }
    }

    pub fn get_u64(&self, field: &FieldDescriptor) -> u64 {
        match self.get_single(field) {
            Some(FieldValue::UInt64(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::UInt64(v)) => *v,
                _ => 0,
            },
        }
    }

    pub fn get_f64(&self, field: &FieldDescriptor) -> f64 {
        match self.get_single(field) {
            Some(FieldValue::Double(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::Double(v)) => *v,
                _ => 0.0,
            },
        }
    }

    pub fn get_f32(&self, field: &FieldDescriptor) -> f32 {
        match self.get_single(field) {
            Some(FieldValue::Float(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::Float(v)) => *v,
                _ => 0.0,
            },
        }
    }

    pub fn get_bool(&self, field: &FieldDescriptor) -> bool {
        match self.get_single(field) {
            Some(FieldValue::Bool(v)) => *v,
            _ => matches!(field.default, Some(DefaultValue::Bool(true))),
        }
    }

    /// Enum value as its underlying number (0 when unset and no declared default).
    pub fn get_enum_value(&self, field: &FieldDescriptor) -> i32 {
        match self.get_single(field) {
            Some(FieldValue::Enum(v)) => *v,
            _ => match &field.default {
                Some(DefaultValue::Enum(v)) => *v,
                _ => 0,
            },
        }
    }

    pub fn get_str<'a>(&'a self, field: &'a FieldDescriptor) -> &'a str {
        match self.get_single(field) {
            Some(FieldValue::Str(v)) => v,
            _ => match &field.default {
                Some(DefaultValue::Str(v)) => v,
                _ => "",
            },
        }
    }

    /// Singular submessage; `None` when unset (message fields have no default
    /// instance here, presence decides).
    pub fn get_message(&self, field: &FieldDescriptor) -> Option<&DynamicMessage> {
        match self.get_single(field) {
            Some(FieldValue::Message(m)) => Some(m),
            _ => None,
        }
    }
}
