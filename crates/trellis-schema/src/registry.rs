//! Schema registry for loading and managing schemas

use crate::coerce::coerce;
use crate::component::{ComponentSchema, ComponentSchemaFile};
use crate::primitive::{PrimitiveSchema, PrimitiveSchemaFile};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use trellis_core::{Result, TrellisError};

/// Registry that holds all loaded component and primitive schemas.
///
/// Registration is append-only: a name can be registered once, and the
/// registry is expected to be fully populated before any resolution starts.
/// After that it is only read, so it can be shared by reference across threads.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    components: HashMap<String, ComponentSchema>,
    primitives: HashMap<String, PrimitiveSchema>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load schemas from multiple directories in order.
    ///
    /// A name declared in two directories is a `DuplicateSchema` error.
    pub fn load_from_directories(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut registry = Self::new();
        for path in paths {
            registry.load_directory(path)?;
        }
        Ok(registry)
    }

    /// Load schemas from a directory into this registry
    ///
    /// Expects:
    /// - `path/components/*.toml` for component schemas
    /// - `path/primitives/*.toml` for primitive schemas
    ///
    /// Components are loaded first so primitive mappings can be checked against them.
    pub fn load_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.load_directory_inner(path.as_ref(), None)
    }

    /// Load a directory on top of what is already registered.
    ///
    /// A component or primitive whose name is taken keeps its first definition;
    /// the skipped names are returned instead of failing the load. Any other
    /// problem is still an error.
    pub fn merge_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>> {
        let mut skipped = Vec::new();
        self.load_directory_inner(path.as_ref(), Some(&mut skipped))?;
        Ok(skipped)
    }

    fn load_directory_inner(&mut self, path: &Path, mut skipped: Option<&mut Vec<String>>) -> Result<()> {
        for file_path in toml_files(&path.join("components"))? {
            let content = fs::read_to_string(&file_path)?;
            self.load_components(&content, skipped.as_deref_mut())?;
        }
        for file_path in toml_files(&path.join("primitives"))? {
            let content = fs::read_to_string(&file_path)?;
            self.load_primitives(&content, skipped.as_deref_mut())?;
        }

        Ok(())
    }

    /// Load component schemas from a TOML file
    pub fn load_component_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = fs::read_to_string(path)?;
        self.load_component_string(&content)
    }

    /// Load component schemas from a TOML string
    pub fn load_component_string(&mut self, content: &str) -> Result<()> {
        self.load_components(content, None)
    }

    fn load_components(&mut self, content: &str, mut skipped: Option<&mut Vec<String>>) -> Result<()> {
        let file: ComponentSchemaFile = toml::from_str(content)?;

        let mut names: Vec<_> = file.component.into_iter().collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, def) in names {
            let schema = def.to_component_schema(name)?;
            match (self.register(schema), skipped.as_deref_mut()) {
                (Err(TrellisError::DuplicateSchema(name)), Some(skipped)) => {
                    tracing::warn!(component = %name, "schema already registered, keeping the first");
                    skipped.push(name);
                }
                (result, _) => result?,
            }
        }

        Ok(())
    }

    /// Load primitive schemas from a TOML file
    pub fn load_primitive_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = fs::read_to_string(path)?;
        self.load_primitive_string(&content)
    }

    /// Load primitive schemas from a TOML string
    pub fn load_primitive_string(&mut self, content: &str) -> Result<()> {
        self.load_primitives(content, None)
    }

    fn load_primitives(&mut self, content: &str, mut skipped: Option<&mut Vec<String>>) -> Result<()> {
        let file: PrimitiveSchemaFile = toml::from_str(content)?;

        let mut names: Vec<_> = file.primitive.into_iter().collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, def) in names {
            let schema = def.to_primitive_schema(name)?;
            match (self.register_primitive(schema), skipped.as_deref_mut()) {
                (Err(TrellisError::DuplicatePrimitive(name)), Some(skipped)) => {
                    tracing::warn!(primitive = %name, "primitive already registered, keeping the first");
                    skipped.push(name);
                }
                (result, _) => result?,
            }
        }

        Ok(())
    }

    /// Register a component schema.
    ///
    /// Fails with `DuplicateSchema` if the name is taken, and with
    /// `InvalidValueForType` if a declared default does not coerce under its
    /// own property type.
    pub fn register(&mut self, schema: ComponentSchema) -> Result<()> {
        if self.components.contains_key(&schema.name) {
            return Err(TrellisError::DuplicateSchema(schema.name));
        }

        for property in schema.properties() {
            if let Some(default) = &property.default {
                coerce(default, &property.value_type).map_err(|e| match e {
                    TrellisError::InvalidValueForType {
                        value,
                        expected,
                        reason,
                    } => TrellisError::InvalidValueForType {
                        value,
                        expected,
                        reason: format!(
                            "default of {}.{}: {}",
                            schema.name, property.name, reason
                        ),
                    },
                    other => other,
                })?;
            }
        }

        tracing::debug!(
            component = %schema.name,
            properties = schema.properties().len(),
            "registered component schema"
        );
        self.components.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Register a primitive schema.
    ///
    /// Mappings that target a registered component must name one of its
    /// properties; mappings onto unregistered components are accepted as-is.
    pub fn register_primitive(&mut self, schema: PrimitiveSchema) -> Result<()> {
        if self.primitives.contains_key(&schema.name) {
            return Err(TrellisError::DuplicatePrimitive(schema.name));
        }

        for mapping in &schema.mappings {
            let Some(component) = self.components.get(&mapping.component) else {
                continue;
            };
            let known = match &mapping.property {
                Some(property) => component.property(property).is_some(),
                None => component.is_single(),
            };
            if !known {
                return Err(TrellisError::InvalidSchema(format!(
                    "{}: attribute '{}' maps to unknown property '{}'",
                    schema.name,
                    mapping.attribute,
                    mapping.target()
                )));
            }
        }

        tracing::debug!(
            primitive = %schema.name,
            mappings = schema.mappings.len(),
            "registered primitive schema"
        );
        self.primitives.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Look up a component schema, failing with `UnknownComponentType` if absent
    pub fn lookup(&self, name: &str) -> Result<&ComponentSchema> {
        self.components
            .get(name)
            .ok_or_else(|| TrellisError::UnknownComponentType(name.to_string()))
    }

    /// Get a component schema by name
    pub fn get_component(&self, name: &str) -> Option<&ComponentSchema> {
        self.components.get(name)
    }

    /// Look up a primitive schema, failing with `PrimitiveNotFound` if absent
    pub fn lookup_primitive(&self, name: &str) -> Result<&PrimitiveSchema> {
        self.primitives
            .get(name)
            .ok_or_else(|| TrellisError::PrimitiveNotFound(name.to_string()))
    }

    pub fn get_primitive(&self, name: &str) -> Option<&PrimitiveSchema> {
        self.primitives.get(name)
    }

    /// List all component names, sorted
    pub fn component_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// List all primitive names, sorted
    pub fn primitive_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.primitives.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let file_path = entry?.path();
        if file_path.extension().map(|e| e == "toml").unwrap_or(false) {
            files.push(file_path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{PropertySchema, ValueType};

    const MATERIAL: &str = r##"
[component.material]
description = "Surface appearance"

[component.material.properties]
color = { type = "color", default = "#FFF" }
side = { type = "enum", values = ["front", "back", "double"], default = "front" }
"##;

    #[test]
    fn test_load_component_string() {
        let mut registry = SchemaRegistry::new();
        registry.load_component_string(MATERIAL).unwrap();

        let material = registry.lookup("material").unwrap();
        assert_eq!(material.name, "material");
        assert_eq!(material.property_names(), vec!["color", "side"]);
    }

    #[test]
    fn test_duplicate_schema() {
        let mut registry = SchemaRegistry::new();
        registry.load_component_string(MATERIAL).unwrap();
        let err = registry.load_component_string(MATERIAL).unwrap_err();
        assert!(matches!(err, TrellisError::DuplicateSchema(name) if name == "material"));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.lookup("pool"),
            Err(TrellisError::UnknownComponentType(name)) if name == "pool"
        ));
        assert!(registry.get_component("pool").is_none());
    }

    #[test]
    fn test_invalid_default_is_rejected() {
        let mut registry = SchemaRegistry::new();
        let schema = ComponentSchema::multiple(
            "pool",
            vec![PropertySchema::new("size", ValueType::Number).with_default("lots")],
        );
        let err = registry.register(schema).unwrap_err();
        assert!(matches!(err, TrellisError::InvalidValueForType { .. }));
        assert!(registry.get_component("pool").is_none());
    }

    #[test]
    fn test_primitive_mapping_checked_against_components() {
        let mut registry = SchemaRegistry::new();
        registry.load_component_string(MATERIAL).unwrap();

        let ok = r#"
[primitive.a-thing.mappings]
color = "material.color"
speed = "custom-mover.speed"
"#;
        registry.load_primitive_string(ok).unwrap();
        assert!(registry.lookup_primitive("a-thing").is_ok());

        let bad = r#"
[primitive.a-broken.mappings]
shine = "material.shininess"
"#;
        let err = registry.load_primitive_string(bad).unwrap_err();
        assert!(matches!(err, TrellisError::InvalidSchema(_)));
        assert!(matches!(
            registry.lookup_primitive("a-broken"),
            Err(TrellisError::PrimitiveNotFound(_))
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("components")).unwrap();
        fs::create_dir(dir.path().join("primitives")).unwrap();
        fs::write(dir.path().join("components/material.toml"), MATERIAL).unwrap();
        fs::write(dir.path().join("components/notes.txt"), "ignored").unwrap();
        fs::write(
            dir.path().join("primitives/a-plate.toml"),
            r#"
[primitive.a-plate.components]
material = "side: double"

[primitive.a-plate.mappings]
color = "material.color"
"#,
        )
        .unwrap();

        let registry = SchemaRegistry::load_from_directories(&[dir.path()]).unwrap();
        assert_eq!(registry.component_names(), vec!["material"]);
        assert_eq!(registry.primitive_names(), vec!["a-plate"]);
    }

    #[test]
    fn test_merge_directory_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("components")).unwrap();
        fs::create_dir(dir.path().join("primitives")).unwrap();
        fs::write(
            dir.path().join("components/extra.toml"),
            r#"
[component.material.properties]
shininess = { type = "number", default = "30" }

[component.spinner.properties]
speed = { type = "number", default = "1" }
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("primitives/a-plate.toml"),
            "[primitive.a-plate.mappings]\ncolor = \"material.color\"\n",
        )
        .unwrap();

        let mut registry = SchemaRegistry::new();
        registry.load_component_string(MATERIAL).unwrap();
        registry
            .load_primitive_string("[primitive.a-plate.components]\nmaterial = \"\"\n")
            .unwrap();

        let skipped = registry.merge_directory(dir.path()).unwrap();
        assert_eq!(skipped, vec!["material", "a-plate"]);
        assert!(registry.lookup("material").unwrap().property("shininess").is_none());
        assert!(registry.lookup("spinner").is_ok());
        assert!(registry.lookup_primitive("a-plate").unwrap().mappings.is_empty());
    }

    #[test]
    fn test_same_name_in_two_directories_is_duplicate() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [&a, &b] {
            fs::create_dir(dir.path().join("components")).unwrap();
            fs::write(dir.path().join("components/material.toml"), MATERIAL).unwrap();
        }
        let result = SchemaRegistry::load_from_directories(&[a.path(), b.path()]);
        assert!(matches!(result, Err(TrellisError::DuplicateSchema(_))));
    }
}
