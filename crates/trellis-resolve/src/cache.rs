//! Memoized entity resolution

use crate::entity::EntityDecl;
use crate::resolver::{EntityAttributeResolver, EntityResolution, ResolveMode};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use trellis_core::{ContentHash, Result};

#[derive(Debug)]
struct CacheEntry {
    version: u64,
    fingerprint: ContentHash,
    mode: ResolveMode,
    resolution: Arc<EntityResolution>,
}

/// Resolutions memoized per entity name.
///
/// An entry is reused only while the mixin registry version, the entity
/// declaration fingerprint, and the resolve mode all match. Invalidation is
/// lazy: stale entries are replaced on the next read.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized resolution if still current, resolving otherwise
    pub fn get_or_resolve(
        &self,
        resolver: &EntityAttributeResolver<'_>,
        entity: &EntityDecl,
    ) -> Result<Arc<EntityResolution>> {
        // Read the version before resolving so a concurrent redefinition marks the result stale.
        let version = resolver.mixins().version();
        let fingerprint = entity.fingerprint();
        let mode = resolver.config().mode;

        if let Some(entry) = self.entries.get(entity.name()) {
            if entry.version == version && entry.fingerprint == fingerprint && entry.mode == mode {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(entity = %entity.name(), "resolution cache hit");
                return Ok(Arc::clone(&entry.resolution));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(entity = %entity.name(), version, "resolution cache miss");
        let resolution = Arc::new(resolver.resolve(entity)?);
        self.entries.insert(
            entity.name().to_string(),
            CacheEntry {
                version,
                fingerprint,
                mode,
                resolution: Arc::clone(&resolution),
            },
        );
        Ok(resolution)
    }

    /// Drop the entry for one entity
    pub fn invalidate(&self, entity: &str) -> bool {
        self.entries.remove(entity).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixin::{Mixin, MixinRegistry};
    use crate::namespace::split;
    use crate::parser::parse;
    use crate::resolver::ResolverConfig;
    use trellis_core::Color;
    use trellis_schema::{SchemaRegistry, TypedValue};

    fn color(resolution: &EntityResolution) -> Option<Color> {
        resolution.value("material", "color").and_then(TypedValue::as_color)
    }

    #[test]
    fn test_hit_when_nothing_changed() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        mixins.register(Mixin::new("red").with_component(split("material"), parse("color: red").unwrap()));
        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let cache = ResolutionCache::new();
        let entity = EntityDecl::new("box").with_mixins(["red"]);

        let first = cache.get_or_resolve(&resolver, &entity).unwrap();
        let second = cache.get_or_resolve(&resolver, &entity).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_mixin_redefinition_makes_entry_stale() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        mixins.register(Mixin::new("tint").with_component(split("material"), parse("color: red").unwrap()));
        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let cache = ResolutionCache::new();
        let entity = EntityDecl::new("box").with_mixins(["tint"]);

        let before = cache.get_or_resolve(&resolver, &entity).unwrap();
        assert_eq!(color(&before), Some(Color::RED));

        mixins.register(Mixin::new("tint").with_component(split("material"), parse("color: blue").unwrap()));
        let after = cache.get_or_resolve(&resolver, &entity).unwrap();
        assert_eq!(color(&after), Some(Color::BLUE));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_entity_mutation_makes_entry_stale() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let cache = ResolutionCache::new();
        let mut entity = EntityDecl::new("box");
        entity.set_attribute("material", "color: red", &schemas).unwrap();

        let before = cache.get_or_resolve(&resolver, &entity).unwrap();
        entity.set_attribute("material", "color: blue", &schemas).unwrap();
        let after = cache.get_or_resolve(&resolver, &entity).unwrap();
        assert_eq!(color(&before), Some(Color::RED));
        assert_eq!(color(&after), Some(Color::BLUE));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_deregistered_mixin_stops_contributing() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        mixins.register(Mixin::new("red").with_component(split("material"), parse("color: red").unwrap()));
        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let cache = ResolutionCache::new();
        let entity = EntityDecl::new("box").with_mixins(["red"]);

        cache.get_or_resolve(&resolver, &entity).unwrap();
        mixins.deregister("red");
        let after = cache.get_or_resolve(&resolver, &entity).unwrap();
        assert!(after.component(&split("material")).is_none());
        assert_eq!(after.diagnostics.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let cache = ResolutionCache::new();
        let entity = EntityDecl::new("box");

        cache.get_or_resolve(&resolver, &entity).unwrap();
        assert!(cache.invalidate("box"));
        assert!(cache.is_empty());
        assert!(!cache.invalidate("box"));
    }
}
