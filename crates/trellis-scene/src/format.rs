//! Scene file format definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trellis_resolve::ResolverConfig;

/// Root structure of a scene TOML file
///
/// ```toml
/// [scene]
/// name = "Gallery"
///
/// [resolver]
/// mode = "lenient"
///
/// [mixins.red]
/// material = "color: red"
///
/// [entities.crate]
/// primitive = "a-box"
/// mixin = "red"
/// position = "0 0.5 -3"
/// depth = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: SceneMetadata,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Mixin id to `component-key = "raw attribute string"`
    #[serde(default)]
    pub mixins: BTreeMap<String, toml::Table>,
    #[serde(default)]
    pub entities: BTreeMap<String, EntityDef>,
}

/// Scene metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Definition of an entity in a scene file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDef {
    /// Optional primitive element name, e.g. `a-box`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<String>,
    /// Whitespace-separated mixin ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixin: Option<String>,
    /// Component keys and mapped primitive attributes, in document order
    #[serde(flatten)]
    pub attributes: toml::Table,
}

impl EntityDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitive(mut self, primitive: impl Into<String>) -> Self {
        self.primitive = Some(primitive.into());
        self
    }

    pub fn with_mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixin = Some(mixin.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, raw: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), toml::Value::String(raw.into()));
        self
    }
}

impl SceneFile {
    /// Create a new scene file
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scene: SceneMetadata {
                name: name.into(),
                version: default_version(),
                description: None,
            },
            resolver: ResolverConfig::default(),
            mixins: BTreeMap::new(),
            entities: BTreeMap::new(),
        }
    }

    /// Add an entity to the scene
    pub fn add_entity(&mut self, name: impl Into<String>, entity: EntityDef) {
        self.entities.insert(name.into(), entity);
    }

    /// Add a mixin from `(component key, raw string)` pairs
    pub fn add_mixin<'a>(
        &mut self,
        id: impl Into<String>,
        components: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let table = components
            .into_iter()
            .map(|(k, v)| (k.to_string(), toml::Value::String(v.to_string())))
            .collect();
        self.mixins.insert(id.into(), table);
    }
}

/// Render a TOML value as raw attribute text.
///
/// Strings pass through, other scalars are stringified, and arrays of
/// scalars are joined with spaces (`[0, 1.5, -3]` reads as `"0 1.5 -3"`).
/// Tables, datetimes and nested arrays have no attribute form.
pub fn attribute_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::Array(_) | toml::Value::Table(_) => None,
                scalar => attribute_text(scalar),
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(" ")),
        toml::Value::Table(_) | toml::Value::Datetime(_) => None,
    }
}
