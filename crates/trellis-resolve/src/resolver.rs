//! Entity attribute resolution
//!
//! Precedence for every component instance and property, low to high:
//! schema default, entity default layer, mixins in list order, the entity's
//! own attributes. Each winning raw value is coerced by the property's type;
//! a value that fails coercion falls back to the schema default and is
//! reported, without affecting any other property.

use crate::diagnostics::Diagnostic;
use crate::entity::EntityDecl;
use crate::merge::MixinResolver;
use crate::mixin::MixinRegistry;
use crate::namespace::{extend_unique, ComponentKey};
use crate::parser::RawAttributeMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use trellis_core::{Result, TrellisError};
use trellis_schema::{coerce, ComponentSchema, SchemaKind, SchemaRegistry, TypedValue};

/// What to do with a component type that has no registered schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Unknown component types fail resolution of the entity
    Strict,
    /// Unknown component types pass through with every property as a string
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub mode: ResolveMode,
}

impl ResolverConfig {
    pub fn strict() -> Self {
        Self {
            mode: ResolveMode::Strict,
        }
    }

    pub fn lenient() -> Self {
        Self {
            mode: ResolveMode::Lenient,
        }
    }
}

/// Final typed configuration of one component instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponentConfig {
    pub key: ComponentKey,
    /// False when the component had no schema and was passed through untyped
    pub typed: bool,
    #[serde(serialize_with = "ordered_map")]
    properties: Vec<(String, TypedValue)>,
}

impl ResolvedComponentConfig {
    pub fn get(&self, property: &str) -> Option<&TypedValue> {
        self.properties
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, v)| v)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The attribute string equivalent of this configuration
    pub fn to_attribute_string(&self) -> String {
        self.properties
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn ordered_map<S: Serializer>(
    properties: &[(String, TypedValue)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(properties.iter().map(|(k, v)| (k, v)))
}

/// Everything resolved for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResolution {
    pub entity: String,
    pub components: Vec<ResolvedComponentConfig>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EntityResolution {
    pub fn component(&self, key: &ComponentKey) -> Option<&ResolvedComponentConfig> {
        self.components.iter().find(|c| c.key == *key)
    }

    /// Shorthand for `component(&split(key)).and_then(|c| c.get(property))`
    pub fn value(&self, key: &str, property: &str) -> Option<&TypedValue> {
        self.component(&crate::namespace::split(key))
            .and_then(|c| c.get(property))
    }

    /// All component instances of one base component, default instance first if present.
    /// Named instances follow in declaration order.
    pub fn instances<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a ResolvedComponentConfig> {
        let of_base = move |c: &&'a ResolvedComponentConfig| c.key.base == base;
        let default = self
            .components
            .iter()
            .filter(of_base)
            .find(|c| c.key.instance.is_none());
        let named = self
            .components
            .iter()
            .filter(of_base)
            .filter(|c| c.key.instance.is_some());
        default.into_iter().chain(named)
    }
}

/// Resolves entity declarations against the schema and mixin registries
pub struct EntityAttributeResolver<'a> {
    schemas: &'a SchemaRegistry,
    mixins: &'a MixinRegistry,
    config: ResolverConfig,
}

impl<'a> EntityAttributeResolver<'a> {
    pub fn new(schemas: &'a SchemaRegistry, mixins: &'a MixinRegistry, config: ResolverConfig) -> Self {
        Self {
            schemas,
            mixins,
            config,
        }
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    pub fn mixins(&self) -> &MixinRegistry {
        self.mixins
    }

    /// Resolve every component instance the entity or its mixins mention.
    ///
    /// Fails only in strict mode, with `UnknownComponentType`, when a
    /// component has no schema. Everything else is reported in
    /// [`EntityResolution::diagnostics`].
    pub fn resolve(&self, entity: &EntityDecl) -> Result<EntityResolution> {
        let name = entity.name();
        let snapshot = MixinResolver::new(self.mixins).snapshot(entity.mixins());
        let mut diagnostics: Vec<Diagnostic> = snapshot
            .unresolved()
            .iter()
            .map(|mixin| Diagnostic::UnresolvedMixin {
                owner: name.to_string(),
                mixin: mixin.clone(),
            })
            .collect();

        let mut keys: Vec<ComponentKey> = entity.defaults().keys().cloned().collect();
        extend_unique(&mut keys, snapshot.keys().iter());
        extend_unique(&mut keys, entity.attributes().keys());

        let mut components = Vec::with_capacity(keys.len());
        for key in keys {
            let mut merged = entity.defaults().get(&key).cloned().unwrap_or_default();
            merged.merge_from(&snapshot.merged(&key));
            if let Some(own) = entity.attribute(&key) {
                merged.merge_from(own);
            }

            let lenient;
            let schema = match self.schemas.lookup(&key.base) {
                Ok(schema) => schema,
                Err(e) => match self.config.mode {
                    ResolveMode::Strict => return Err(e),
                    ResolveMode::Lenient => {
                        diagnostics.push(Diagnostic::UnknownComponentType {
                            owner: name.to_string(),
                            component: key.clone(),
                        });
                        lenient = ComponentSchema::lenient(key.base.clone());
                        &lenient
                    }
                },
            };

            components.push(resolve_component(name, key, schema, &merged, &mut diagnostics));
        }

        for diagnostic in &diagnostics {
            diagnostic.log();
        }
        tracing::debug!(
            entity = %name,
            components = components.len(),
            diagnostics = diagnostics.len(),
            "resolved entity"
        );

        Ok(EntityResolution {
            entity: name.to_string(),
            components,
            diagnostics,
        })
    }

    /// Resolve many entities in parallel; results are in input order
    pub fn resolve_all(&self, entities: &[EntityDecl]) -> Vec<Result<EntityResolution>> {
        entities.par_iter().map(|entity| self.resolve(entity)).collect()
    }
}

fn resolve_component(
    owner: &str,
    key: ComponentKey,
    schema: &ComponentSchema,
    merged: &RawAttributeMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> ResolvedComponentConfig {
    if let SchemaKind::Lenient = schema.kind {
        let properties = merged
            .iter()
            .map(|(k, v)| (k.to_string(), TypedValue::String(v.to_string())))
            .collect();
        return ResolvedComponentConfig {
            key,
            typed: false,
            properties,
        };
    }

    let mut properties = Vec::with_capacity(schema.properties().len());
    for property in schema.properties() {
        let default = || {
            property
                .default
                .as_deref()
                .and_then(|d| coerce(d, &property.value_type).ok())
        };
        let value = match merged.get(&property.name) {
            Some(raw) => match coerce(raw, &property.value_type) {
                Ok(value) => Some(value),
                Err(TrellisError::InvalidValueForType {
                    value,
                    expected,
                    reason,
                }) => {
                    diagnostics.push(Diagnostic::InvalidValueForType {
                        owner: owner.to_string(),
                        component: key.clone(),
                        property: property.name.clone(),
                        value,
                        expected,
                        reason,
                    });
                    default()
                }
                Err(other) => {
                    diagnostics.push(Diagnostic::InvalidValueForType {
                        owner: owner.to_string(),
                        component: key.clone(),
                        property: property.name.clone(),
                        value: raw.to_string(),
                        expected: property.value_type.type_name().to_string(),
                        reason: other.to_string(),
                    });
                    default()
                }
            },
            None => default(),
        };
        if let Some(value) = value {
            properties.push((property.name.clone(), value));
        }
    }

    for name in merged.keys() {
        if schema.property(name).is_none() {
            diagnostics.push(Diagnostic::UnknownProperty {
                owner: owner.to_string(),
                component: key.clone(),
                property: name.to_string(),
            });
        }
    }

    ResolvedComponentConfig {
        key,
        typed: true,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixin::Mixin;
    use crate::namespace::split;
    use crate::parser::parse;
    use trellis_core::{Color, Vec3};
    use trellis_schema::{PropertySchema, ValueType};

    fn schemas() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(ComponentSchema::multiple(
                "material",
                vec![
                    PropertySchema::new("color", ValueType::Color).with_default("#FFF"),
                    PropertySchema::new(
                        "side",
                        ValueType::Enum {
                            values: vec!["front".into(), "back".into(), "double".into()],
                        },
                    )
                    .with_default("front"),
                ],
            ))
            .unwrap();
        registry
            .register(ComponentSchema::multiple(
                "pool",
                vec![
                    PropertySchema::new("size", ValueType::Number).with_default("0"),
                    PropertySchema::new("dynamic", ValueType::Boolean).with_default("false"),
                    PropertySchema::new("mixin", ValueType::String),
                ],
            ))
            .unwrap();
        registry
            .register(ComponentSchema::single(
                "position",
                ValueType::Vector3,
                Some("0 0 0"),
            ))
            .unwrap();
        registry
    }

    fn red_mixin() -> Mixin {
        Mixin::new("red").with_component(split("material"), parse("color: red").unwrap())
    }

    fn entity(name: &str) -> EntityDecl {
        EntityDecl::new(name)
    }

    fn resolve(entity: &EntityDecl, schemas: &SchemaRegistry, mixins: &MixinRegistry) -> EntityResolution {
        EntityAttributeResolver::new(schemas, mixins, ResolverConfig::default())
            .resolve(entity)
            .unwrap()
    }

    #[test]
    fn test_mixin_sets_color() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());

        let e = entity("box").with_mixins(["red"]);
        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::RED)));
        assert_eq!(resolved.value("material", "side"), Some(&TypedValue::Enum("front".into())));
        assert!(resolved.diagnostics.is_empty());
    }

    #[test]
    fn test_own_attribute_overrides_mixin() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());

        let mut e = entity("box").with_mixins(["red"]);
        e.set_attribute("material", "color: blue", &schemas).unwrap();
        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::BLUE)));
    }

    #[test]
    fn test_later_mixin_wins_and_own_wins_over_both() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        mixins.register(
            Mixin::new("back").with_component(split("material"), parse("color: green; side: back").unwrap()),
        );

        let e = entity("box").with_mixins(["red", "back"]);
        let resolved = resolve(&e, &schemas, &mixins);
        let green = Color::parse("green").unwrap();
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(green)));
        assert_eq!(resolved.value("material", "side"), Some(&TypedValue::Enum("back".into())));

        let e = e.with_component(split("material"), parse("color: blue").unwrap());
        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::BLUE)));
        assert_eq!(resolved.value("material", "side"), Some(&TypedValue::Enum("back".into())));
    }

    #[test]
    fn test_invalid_value_falls_back_with_one_diagnostic() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("spawner");
        e.set_attribute("pool", "size: 10; dynamic: maybe", &schemas).unwrap();

        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("pool", "size"), Some(&TypedValue::Number(10.0)));
        assert_eq!(resolved.value("pool", "dynamic"), Some(&TypedValue::Boolean(false)));
        assert_eq!(resolved.diagnostics.len(), 1);
        assert!(matches!(
            &resolved.diagnostics[0],
            Diagnostic::InvalidValueForType { property, value, component, .. }
                if property == "dynamic" && value == "maybe" && *component == split("pool")
        ));
    }

    #[test]
    fn test_property_without_default_is_omitted() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("spawner");
        e.set_attribute("pool", "size: 3", &schemas).unwrap();
        let resolved = resolve(&e, &schemas, &mixins);
        let pool = resolved.component(&split("pool")).unwrap();
        assert!(pool.get("mixin").is_none());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_instances_are_independent() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("spawner");
        e.set_attribute("pool__enemy", "size: 5", &schemas).unwrap();
        e.set_attribute("pool", "size: 2", &schemas).unwrap();

        let resolved = resolve(&e, &schemas, &mixins);
        let enemy = resolved.component(&split("pool__enemy")).unwrap();
        let default = resolved.component(&ComponentKey::new("pool")).unwrap();
        assert_eq!(enemy.key.instance.as_deref(), Some("enemy"));
        assert_eq!(default.key.instance, None);
        assert_eq!(enemy.get("size"), Some(&TypedValue::Number(5.0)));
        assert_eq!(default.get("size"), Some(&TypedValue::Number(2.0)));
        assert_eq!(resolved.instances("pool").count(), 2);
    }

    #[test]
    fn test_instances_yield_default_first() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("spawner");
        e.set_attribute("pool__enemy", "size: 5", &schemas).unwrap();
        e.set_attribute("pool__bullet", "size: 9", &schemas).unwrap();
        e.set_attribute("pool", "size: 2", &schemas).unwrap();

        let resolved = resolve(&e, &schemas, &mixins);
        let instances: Vec<_> = resolved
            .instances("pool")
            .map(|c| c.key.instance.as_deref())
            .collect();
        assert_eq!(instances, vec![None, Some("enemy"), Some("bullet")]);

        let mut named_only = entity("spawner");
        named_only.set_attribute("pool__enemy", "size: 5", &schemas).unwrap();
        let resolved = resolve(&named_only, &schemas, &mixins);
        let instances: Vec<_> = resolved
            .instances("pool")
            .map(|c| c.key.instance.as_deref())
            .collect();
        assert_eq!(instances, vec![Some("enemy")]);
    }

    #[test]
    fn test_no_mixins_is_defaults_plus_own() {
        let schemas = schemas();
        let with_registry_content = MixinRegistry::new();
        with_registry_content.register(red_mixin());
        let empty = MixinRegistry::new();

        let mut e = entity("box");
        e.set_attribute("material", "side: double", &schemas).unwrap();
        let a = resolve(&e, &schemas, &with_registry_content);
        let b = resolve(&e, &schemas, &empty);
        assert_eq!(a, b);
        assert_eq!(a.value("material", "color"), Some(&TypedValue::Color(Color::WHITE)));
        assert_eq!(a.value("material", "side"), Some(&TypedValue::Enum("double".into())));
    }

    #[test]
    fn test_unresolved_mixin_reported_once() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        let e = entity("box").with_mixins(["ghost", "red", "ghost"]);
        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::RED)));
        let unresolved: Vec<_> = resolved
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedMixin { .. }))
            .collect();
        assert_eq!(unresolved.len(), 1);
    }

    #[test]
    fn test_unknown_property_dropped_with_warning() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("box");
        e.set_attribute("material", "color: red; shininess: 9", &schemas).unwrap();
        let resolved = resolve(&e, &schemas, &mixins);
        let material = resolved.component(&split("material")).unwrap();
        assert!(material.get("shininess").is_none());
        assert!(matches!(
            &resolved.diagnostics[..],
            [Diagnostic::UnknownProperty { property, .. }] if property == "shininess"
        ));
    }

    #[test]
    fn test_single_property_component() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("box");
        e.set_attribute("position", "1 2 3", &schemas).unwrap();
        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(
            resolved.value("position", "value"),
            Some(&TypedValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))
        );
    }

    #[test]
    fn test_unknown_component_lenient_and_strict() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        let mut e = entity("box");
        e.set_attribute("spinner", "speed: 2; axis: y", &schemas).unwrap();

        let resolved = resolve(&e, &schemas, &mixins);
        let spinner = resolved.component(&split("spinner")).unwrap();
        assert!(!spinner.typed);
        assert_eq!(spinner.get("speed"), Some(&TypedValue::String("2".into())));
        assert!(matches!(
            &resolved.diagnostics[..],
            [Diagnostic::UnknownComponentType { .. }]
        ));

        let strict = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::strict());
        assert!(matches!(
            strict.resolve(&e),
            Err(TrellisError::UnknownComponentType(name)) if name == "spinner"
        ));
    }

    #[test]
    fn test_default_layer_is_below_mixins() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        let mut e = entity("sky").with_mixins(["red"]);
        e.set_default_component(split("material"), parse("color: black; side: back").unwrap());

        let resolved = resolve(&e, &schemas, &mixins);
        assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::RED)));
        assert_eq!(resolved.value("material", "side"), Some(&TypedValue::Enum("back".into())));
    }

    #[test]
    fn test_key_order_mixins_then_own() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        let mut e = entity("box").with_mixins(["red"]);
        e.set_attribute("position", "0 1 0", &schemas).unwrap();
        e.set_attribute("material", "side: back", &schemas).unwrap();

        let resolved = resolve(&e, &schemas, &mixins);
        let keys: Vec<String> = resolved.components.iter().map(|c| c.key.to_string()).collect();
        assert_eq!(keys, vec!["material", "position"]);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        let mut e = entity("box").with_mixins(["red"]);
        e.set_attribute("pool", "size: nope", &schemas).unwrap();
        assert_eq!(resolve(&e, &schemas, &mixins), resolve(&e, &schemas, &mixins));
    }

    #[test]
    fn test_resolve_all_keeps_input_order() {
        let schemas = schemas();
        let mixins = MixinRegistry::new();
        mixins.register(red_mixin());
        let entities: Vec<EntityDecl> = (0..32)
            .map(|i| entity(&format!("e{}", i)).with_mixins(["red"]))
            .collect();

        let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
        let results = resolver.resolve_all(&entities);
        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            let resolved = result.as_ref().unwrap();
            assert_eq!(resolved.entity, format!("e{}", i));
            assert_eq!(resolved.value("material", "color"), Some(&TypedValue::Color(Color::RED)));
        }
    }

    #[test]
    fn test_config_serializes_as_table() {
        let json = serde_json::to_value(ResolverConfig::strict()).unwrap();
        assert_eq!(json["mode"], "strict");
        let resolved = {
            let schemas = schemas();
            let mixins = MixinRegistry::new();
            let mut e = entity("box");
            e.set_attribute("pool", "size: 4", &schemas).unwrap();
            resolve(&e, &schemas, &mixins)
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["components"][0]["key"], "pool");
        assert_eq!(json["components"][0]["properties"]["size"]["value"], 4.0);
    }
}
