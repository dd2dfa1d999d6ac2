//! Trellis Schema - Component schemas and typed values
//!
//! This crate declares which properties each component type recognizes,
//! what type each property has, and what its default is. It also owns the
//! coercion of raw attribute strings into typed values and the primitive
//! element definitions that map shorthand attributes onto components.

mod builtin;
mod coerce;
mod component;
mod primitive;
mod registry;

pub use coerce::{coerce, SelectorRef, TypedValue};
pub use component::{ComponentSchema, PropertySchema, SchemaKind, ValueType, SINGLE_PROPERTY};
pub use primitive::{AttributeMapping, PrimitiveSchema};
pub use registry::SchemaRegistry;
