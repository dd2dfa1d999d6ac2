//! Trellis Resolve - Attribute resolution for Trellis
//!
//! Turns raw attribute strings and mixin lists into typed, fully-defaulted
//! component configurations:
//! - `parser` - `key: value; ...` strings into ordered raw maps
//! - `namespace` - `pool__enemy` style component instance keys
//! - `mixin` / `merge` - the concurrent mixin registry and list merging
//! - `resolver` - per-entity precedence, coercion, and diagnostics
//! - `cache` - memoized resolution invalidated by content and version

mod cache;
mod diagnostics;
mod entity;
mod merge;
mod mixin;
mod namespace;
mod parser;
mod resolver;

pub use cache::ResolutionCache;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use entity::{parse_mixin_list, EntityDecl, MIXIN_ATTRIBUTE};
pub use merge::{MixinResolver, MixinSnapshot};
pub use mixin::{Mixin, MixinRegistry, Registration};
pub use namespace::{split, ComponentAttributes, ComponentKey, INSTANCE_SEPARATOR};
pub use parser::{parse, parse_for_schema, RawAttributeMap};
pub use resolver::{
    EntityAttributeResolver, EntityResolution, ResolveMode, ResolvedComponentConfig, ResolverConfig,
};
