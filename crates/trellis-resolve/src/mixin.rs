//! Mixins and the mixin registry

use crate::diagnostics::Diagnostic;
use crate::namespace::{split, ComponentAttributes, ComponentKey};
use crate::parser::{parse_for_schema, RawAttributeMap};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use trellis_core::ContentHash;
use trellis_schema::SchemaRegistry;

/// A named, reusable bundle of component attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixin {
    id: String,
    components: ComponentAttributes,
}

impl Mixin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            components: ComponentAttributes::new(),
        }
    }

    /// Build a mixin from `(attribute key, raw string)` pairs.
    ///
    /// Each string is parsed according to its component's schema. A malformed
    /// string is reported and skipped; the other attributes are kept.
    pub fn declare<'a>(
        id: impl Into<String>,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
        schemas: &SchemaRegistry,
    ) -> (Self, Vec<Diagnostic>) {
        let mut mixin = Self::new(id);
        let mut diagnostics = Vec::new();
        for (attribute, raw) in attributes {
            let key = split(attribute);
            match parse_for_schema(raw, schemas.get_component(&key.base)) {
                Ok(map) => {
                    mixin.components.insert(key, map);
                }
                Err(e) => diagnostics.push(Diagnostic::MalformedAttributeString {
                    owner: mixin.id.clone(),
                    attribute: attribute.to_string(),
                    input: raw.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        (mixin, diagnostics)
    }

    pub fn with_component(mut self, key: ComponentKey, map: RawAttributeMap) -> Self {
        self.components.insert(key, map);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn component(&self, key: &ComponentKey) -> Option<&RawAttributeMap> {
        self.components.get(key)
    }

    pub fn components(&self) -> &ComponentAttributes {
        &self.components
    }

    pub fn keys(&self) -> impl Iterator<Item = &ComponentKey> {
        self.components.keys()
    }

    /// Content fingerprint over the id and every component attribute
    pub fn fingerprint(&self) -> ContentHash {
        let parts: Vec<String> = std::iter::once(self.id.clone())
            .chain(self.components.hash_parts())
            .collect();
        ContentHash::from_parts(parts.iter().map(String::as_str))
    }
}

/// What a call to [`MixinRegistry::register`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The id was new
    Created,
    /// The id existed with different content; entities referencing it are stale
    Redefined,
    /// The id existed with identical content; nothing changed
    Unchanged,
}

#[derive(Debug)]
struct MixinEntry {
    mixin: Arc<Mixin>,
    fingerprint: ContentHash,
}

/// Concurrent table of mixins by id.
///
/// Definitions are swapped as whole `Arc`s, so a lookup sees either the old
/// or the new definition of a mixin and never a mix. Every effective change
/// bumps a registry-wide version used to invalidate memoized resolutions.
#[derive(Debug, Default)]
pub struct MixinRegistry {
    mixins: DashMap<String, MixinEntry>,
    version: AtomicU64,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a mixin
    pub fn register(&self, mixin: Mixin) -> Registration {
        let fingerprint = mixin.fingerprint();
        let id = mixin.id.clone();
        let outcome = match self.mixins.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().fingerprint == fingerprint {
                    Registration::Unchanged
                } else {
                    occupied.insert(MixinEntry {
                        mixin: Arc::new(mixin),
                        fingerprint,
                    });
                    self.version.fetch_add(1, Ordering::AcqRel);
                    Registration::Redefined
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MixinEntry {
                    mixin: Arc::new(mixin),
                    fingerprint,
                });
                self.version.fetch_add(1, Ordering::AcqRel);
                Registration::Created
            }
        };

        match outcome {
            Registration::Redefined => tracing::info!(mixin = %id, "mixin redefined"),
            _ => tracing::debug!(mixin = %id, ?outcome, "mixin registered"),
        }
        outcome
    }

    /// Remove a mixin, returning its last definition
    pub fn deregister(&self, id: &str) -> Option<Arc<Mixin>> {
        let (_, entry) = self.mixins.remove(id)?;
        self.version.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(mixin = %id, "mixin deregistered");
        Some(entry.mixin)
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Mixin>> {
        self.mixins.get(id).map(|entry| Arc::clone(&entry.mixin))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mixins.contains_key(id)
    }

    /// Registry-wide version; changes whenever any mixin is created, redefined, or removed
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// All registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.mixins.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }
}
