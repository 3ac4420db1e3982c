//! # pbhost — reflective protobuf field extraction for scripting hosts
//!
//! Converts protocol-buffer message fields into dynamically-typed host values
//! for an embedding scripting runtime, driven by runtime type descriptors
//! (reflection) rather than generated per-type accessors.
//!
//! ## Pieces
//!
//! - **Schema**: a proto-subset schema text (PEST grammar) compiled into
//!   immutable, shared descriptors; `map<K, V>` fields are lowered to repeated
//!   map-entry submessages exactly as protobuf does.
//! - **DynamicMessage**: descriptor-typed field storage with a reflection-style
//!   surface (presence, default-substituting getters, indexed repeated access,
//!   checked mutation).
//! - **HostValue**: the value model handed to the host runtime — one case per
//!   scalar kind plus nil, ordered table, associative map, and an `Rc` handle
//!   owning a deep message copy.
//! - **Extraction**: [`get_message_field`] / [`get_repeated_field`] dispatch on
//!   the field's declared kind and cardinality; unknown kinds fail with
//!   [`ExtractError::UnsupportedType`], map entries are decomposed into
//!   key/value form.
//!
//! ## Example schema
//!
//! ```text
//! message Point {
//!   int32 x = 1;
//!   int32 y = 2;
//! }
//!
//! message Route {
//!   repeated Point points = 1;
//!   map<string, int32> labels = 2;
//! }
//! ```
//!
//! ## Usage
//!
//! Parse with [`parse`], resolve with [`Schema::resolve`], build messages with
//! [`DynamicMessage`], extract with [`get_message_field`]. See
//! `tests/integration.rs` for full examples.

pub mod descriptor;
pub mod dump;
pub mod extract;
pub mod host;
pub mod message;
pub mod parser;

pub use descriptor::{
    Cardinality, DefaultValue, EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor,
    RawSchema, Schema, SchemaError,
};
pub use dump::{host_value_to_dump, message_to_dump};
pub use extract::{get_message_field, get_repeated_field, ExtractError};
pub use host::{HostValue, MapKey};
pub use message::{DynamicMessage, FieldValue, MessageError};
pub use parser::parse;
