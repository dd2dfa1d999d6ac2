//! Mixin list merging

use crate::mixin::{Mixin, MixinRegistry};
use crate::namespace::{extend_unique, ComponentKey};
use crate::parser::RawAttributeMap;
use std::sync::Arc;

/// Merges the attributes of an ordered mixin list, later mixins winning per property
pub struct MixinResolver<'a> {
    registry: &'a MixinRegistry,
}

impl<'a> MixinResolver<'a> {
    pub fn new(registry: &'a MixinRegistry) -> Self {
        Self { registry }
    }

    /// Merged raw attributes for one component instance.
    ///
    /// Ids that are not registered contribute nothing. Never fails.
    pub fn resolve(&self, mixin_ids: &[String], key: &ComponentKey) -> RawAttributeMap {
        self.snapshot(mixin_ids).merged(key)
    }

    /// Look up every id once, so all component keys of one entity see the same definitions
    pub fn snapshot(&self, mixin_ids: &[String]) -> MixinSnapshot {
        let mut mixins = Vec::with_capacity(mixin_ids.len());
        let mut unresolved: Vec<String> = Vec::new();
        for id in mixin_ids {
            match self.registry.lookup(id) {
                Some(mixin) => mixins.push(mixin),
                None => {
                    if !unresolved.contains(id) {
                        unresolved.push(id.clone());
                    }
                }
            }
        }
        MixinSnapshot { mixins, unresolved }
    }
}

/// The mixins of one entity as they were at lookup time
#[derive(Debug, Clone, Default)]
pub struct MixinSnapshot {
    mixins: Vec<Arc<Mixin>>,
    unresolved: Vec<String>,
}

impl MixinSnapshot {
    /// Merge every mixin's map for `key` in list order
    pub fn merged(&self, key: &ComponentKey) -> RawAttributeMap {
        let mut merged = RawAttributeMap::new();
        for mixin in &self.mixins {
            if let Some(map) = mixin.component(key) {
                merged.merge_from(map);
            }
        }
        merged
    }

    /// Component keys mentioned by any mixin, in list order then first-seen order
    pub fn keys(&self) -> Vec<ComponentKey> {
        let mut order = Vec::new();
        for mixin in &self.mixins {
            extend_unique(&mut order, mixin.keys());
        }
        order
    }

    /// Distinct ids that were not registered, in first-referenced order
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::split;
    use crate::parser::parse;

    fn registry() -> MixinRegistry {
        let registry = MixinRegistry::new();
        registry.register(
            Mixin::new("a")
                .with_component(split("material"), parse("color: red; side: back").unwrap())
                .with_component(split("geometry"), parse("primitive: sphere").unwrap()),
        );
        registry.register(
            Mixin::new("b").with_component(split("material"), parse("color: blue").unwrap()),
        );
        registry
    }

    fn ids(list: &str) -> Vec<String> {
        list.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_later_mixin_wins_per_property() {
        let registry = registry();
        let merged = MixinResolver::new(&registry).resolve(&ids("a b"), &split("material"));
        assert_eq!(merged.get("color"), Some("blue"));
        assert_eq!(merged.get("side"), Some("back"));
    }

    #[test]
    fn test_order_matters() {
        let registry = registry();
        let merged = MixinResolver::new(&registry).resolve(&ids("b a"), &split("material"));
        assert_eq!(merged.get("color"), Some("red"));
    }

    #[test]
    fn test_repeated_id_is_idempotent() {
        let registry = registry();
        let resolver = MixinResolver::new(&registry);
        let merged = resolver.resolve(&ids("a b a"), &split("material"));
        assert_eq!(merged.get("color"), Some("red"));
        assert_eq!(
            resolver.resolve(&ids("a a"), &split("material")),
            resolver.resolve(&ids("a"), &split("material"))
        );
    }

    #[test]
    fn test_missing_mixin_contributes_nothing() {
        let registry = registry();
        let resolver = MixinResolver::new(&registry);
        let snapshot = resolver.snapshot(&ids("ghost a ghost"));
        assert_eq!(snapshot.unresolved(), ["ghost".to_string()]);
        assert_eq!(snapshot.merged(&split("material")).get("color"), Some("red"));
        assert!(resolver.resolve(&ids("ghost"), &split("material")).is_empty());
    }

    #[test]
    fn test_instance_keys_do_not_mix() {
        let registry = MixinRegistry::new();
        registry.register(
            Mixin::new("pools")
                .with_component(split("pool"), parse("size: 1").unwrap())
                .with_component(split("pool__enemy"), parse("size: 5").unwrap()),
        );
        let resolver = MixinResolver::new(&registry);
        let list = ids("pools");
        assert_eq!(resolver.resolve(&list, &split("pool")).get("size"), Some("1"));
        assert_eq!(resolver.resolve(&list, &split("pool__enemy")).get("size"), Some("5"));
        assert!(resolver.resolve(&list, &split("pool__ally")).is_empty());
    }

    #[test]
    fn test_snapshot_keys_in_list_order() {
        let registry = registry();
        let snapshot = MixinResolver::new(&registry).snapshot(&ids("b a"));
        let keys: Vec<String> = snapshot.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["material", "geometry"]);
    }
}
