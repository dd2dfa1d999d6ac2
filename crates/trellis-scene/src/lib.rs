//! Trellis Scene - TOML scene declarations
//!
//! This crate loads scene files declaring mixins and entities as raw
//! attribute strings, and expands primitives into entity declarations.

mod expand;
mod format;
mod loader;

pub use expand::expand_entity;
pub use format::{attribute_text, EntityDef, SceneFile, SceneMetadata};
pub use loader::{load_scene, load_scene_string, LoadedScene, MixinSync};
