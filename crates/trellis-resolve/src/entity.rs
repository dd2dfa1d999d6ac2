//! Entity attribute declarations

use crate::namespace::{split, ComponentAttributes, ComponentKey};
use crate::parser::{parse_for_schema, RawAttributeMap};
use trellis_core::{ContentHash, Result};
use trellis_schema::SchemaRegistry;

/// Attribute key holding the whitespace-separated mixin list
pub const MIXIN_ATTRIBUTE: &str = "mixin";

/// Split a `mixin` attribute value into ids, keeping order and repeats
pub fn parse_mixin_list(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// The declared attributes of one entity.
///
/// Resolution is always recomputed from this declaration; any mutation
/// changes its [`fingerprint`](EntityDecl::fingerprint).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDecl {
    name: String,
    mixins: Vec<String>,
    /// Lowest layer, below mixins (primitive default components)
    defaults: ComponentAttributes,
    attributes: ComponentAttributes,
}

impl EntityDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mixins<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mixins = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_component(mut self, key: ComponentKey, map: RawAttributeMap) -> Self {
        self.attributes.insert(key, map);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mixins(&self) -> &[String] {
        &self.mixins
    }

    pub fn set_mixins(&mut self, ids: Vec<String>) {
        self.mixins = ids;
    }

    /// Set one attribute from its raw markup form.
    ///
    /// The `mixin` key sets the mixin list. Any other key is split into a
    /// component instance and its string parsed according to the component's
    /// schema, replacing whatever that instance had before. On a malformed
    /// string the declaration is left unchanged.
    pub fn set_attribute(&mut self, key: &str, raw: &str, schemas: &SchemaRegistry) -> Result<()> {
        if key == MIXIN_ATTRIBUTE {
            self.mixins = parse_mixin_list(raw);
            return Ok(());
        }
        let key = split(key);
        let map = parse_for_schema(raw, schemas.get_component(&key.base))?;
        self.attributes.insert(key, map);
        Ok(())
    }

    /// Replace the whole map of one component instance
    pub fn set_component(&mut self, key: ComponentKey, map: RawAttributeMap) {
        self.attributes.insert(key, map);
    }

    /// Set a single property on one component instance, keeping its other properties
    pub fn set_property(&mut self, key: ComponentKey, property: &str, raw: &str) {
        self.attributes.entry(key).insert(property, raw.trim());
    }

    /// Remove an attribute; returns whether anything was removed
    pub fn remove_attribute(&mut self, key: &str) -> bool {
        if key == MIXIN_ATTRIBUTE {
            let had = !self.mixins.is_empty();
            self.mixins.clear();
            return had;
        }
        self.attributes.remove(&split(key)).is_some()
    }

    pub fn attribute(&self, key: &ComponentKey) -> Option<&RawAttributeMap> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &ComponentAttributes {
        &self.attributes
    }

    /// Set a default component map, overridden by mixins and own attributes
    pub fn set_default_component(&mut self, key: ComponentKey, map: RawAttributeMap) {
        self.defaults.insert(key, map);
    }

    pub fn defaults(&self) -> &ComponentAttributes {
        &self.defaults
    }

    /// Content fingerprint over everything resolution reads from this declaration
    pub fn fingerprint(&self) -> ContentHash {
        let parts: Vec<String> = std::iter::once(self.name.clone())
            .chain(std::iter::once(self.mixins.len().to_string()))
            .chain(self.mixins.iter().cloned())
            .chain(std::iter::once(self.defaults.len().to_string()))
            .chain(self.defaults.hash_parts())
            .chain(self.attributes.hash_parts())
            .collect();
        ContentHash::from_parts(parts.iter().map(String::as_str))
    }
}
