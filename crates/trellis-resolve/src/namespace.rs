//! Component instance keys
//!
//! An attribute key such as `pool__enemy` names the `enemy` instance of the
//! `pool` component. A key without the separator names the default instance.

use crate::parser::RawAttributeMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between base component name and instance discriminator
pub const INSTANCE_SEPARATOR: &str = "__";

/// A component base name plus optional instance discriminator.
///
/// `None` and `Some("")` are different instances: `pool` and `pool__` coexist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ComponentKey {
    pub base: String,
    pub instance: Option<String>,
}

impl ComponentKey {
    /// The default instance of a component
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            instance: None,
        }
    }

    pub fn with_instance(base: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            instance: Some(instance.into()),
        }
    }

    pub fn is_default_instance(&self) -> bool {
        self.instance.is_none()
    }
}

/// Split a user-facing attribute key on the first separator
pub fn split(key: &str) -> ComponentKey {
    match key.split_once(INSTANCE_SEPARATOR) {
        Some((base, instance)) => ComponentKey::with_instance(base, instance),
        None => ComponentKey::new(key),
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}{}{}", self.base, INSTANCE_SEPARATOR, instance),
            None => f.write_str(&self.base),
        }
    }
}

impl From<&str> for ComponentKey {
    fn from(key: &str) -> Self {
        split(key)
    }
}

impl From<String> for ComponentKey {
    fn from(key: String) -> Self {
        split(&key)
    }
}

impl From<ComponentKey> for String {
    fn from(key: ComponentKey) -> Self {
        key.to_string()
    }
}

/// Raw attribute maps keyed by component instance, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAttributes {
    entries: Vec<(ComponentKey, RawAttributeMap)>,
}

impl ComponentAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the map for a key, replacing any previous one in place
    pub fn insert(&mut self, key: ComponentKey, map: RawAttributeMap) -> Option<RawAttributeMap> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, map)),
            None => {
                self.entries.push((key, map));
                None
            }
        }
    }

    /// Mutable access to the map for a key, creating an empty one if needed
    pub fn entry(&mut self, key: ComponentKey) -> &mut RawAttributeMap {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, RawAttributeMap::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&RawAttributeMap> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn remove(&mut self, key: &ComponentKey) -> Option<RawAttributeMap> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ComponentKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ComponentKey, &RawAttributeMap)> {
        self.entries.iter().map(|(k, m)| (k, m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every key and property as flat string parts, for fingerprinting
    pub(crate) fn hash_parts(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().flat_map(|(key, map)| {
            std::iter::once(key.to_string())
                .chain(std::iter::once(map.len().to_string()))
                .chain(map.iter().flat_map(|(k, v)| [k.to_string(), v.to_string()]))
        })
    }
}

/// Append keys to `order` that it does not already contain, keeping first-seen order
pub fn extend_unique<'a>(order: &mut Vec<ComponentKey>, keys: impl Iterator<Item = &'a ComponentKey>) {
    for key in keys {
        if !order.contains(key) {
            order.push(key.clone());
        }
    }
}
