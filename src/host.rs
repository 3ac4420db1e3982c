//! Host values: the dynamically-typed representation handed to the embedding
//! scripting runtime.

use crate::message::DynamicMessage;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A value produced for the host runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Nil,
    Int(i64),
    UInt(u64),
    Double(f64),
    Float(f32),
    Bool(bool),
    Str(String),
    /// Opaque handle to an independently-owned message copy. The `Rc` is the
    /// host runtime's reclamation domain; the copy never aliases the source.
    Message(Rc<DynamicMessage>),
    /// Ordered table: entry `i` holds the source element at index `i`.
    Table(Vec<HostValue>),
    /// Associative result of a map field, keyed by the entry keys.
    Map(BTreeMap<MapKey, HostValue>),
}

/// Map keys are restricted to the protobuf map key kinds; totally ordered for
/// deterministic iteration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
}

impl HostValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            HostValue::UInt(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Double(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            HostValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Rc<DynamicMessage>> {
        match self {
            HostValue::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Table(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, HostValue>> {
        match self {
            HostValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Reinterpret a scalar host value as a map key, if its kind is allowed.
    pub fn as_map_key(&self) -> Option<MapKey> {
        match self {
            HostValue::Bool(b) => Some(MapKey::Bool(*b)),
            HostValue::Int(i) => Some(MapKey::Int(*i)),
            HostValue::UInt(u) => Some(MapKey::UInt(*u)),
            HostValue::Str(s) => Some(MapKey::Str(s.clone())),
            _ => None,
        }
    }
}
