//! Scene loading from TOML files

use crate::expand::expand_entity;
use crate::format::{attribute_text, SceneFile, SceneMetadata};
use std::fs;
use std::path::Path;
use trellis_core::Result;
use trellis_resolve::{
    Diagnostic, EntityDecl, Mixin, MixinRegistry, Registration, ResolverConfig, MIXIN_ATTRIBUTE,
};
use trellis_schema::SchemaRegistry;

/// A scene parsed into mixins and entity declarations
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub metadata: SceneMetadata,
    pub config: ResolverConfig,
    pub mixins: Vec<Mixin>,
    pub entities: Vec<EntityDecl>,
    /// Problems found while reading attribute strings
    pub diagnostics: Vec<Diagnostic>,
}

/// What [`LoadedScene::sync_mixins`] changed in a registry
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MixinSync {
    pub created: Vec<String>,
    pub redefined: Vec<String>,
    pub removed: Vec<String>,
}

impl MixinSync {
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.redefined.is_empty() && self.removed.is_empty()
    }
}

impl LoadedScene {
    pub fn entity(&self, name: &str) -> Option<&EntityDecl> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// A fresh mixin registry holding this scene's mixins
    pub fn mixin_registry(&self) -> MixinRegistry {
        let registry = MixinRegistry::new();
        self.sync_mixins(&registry);
        registry
    }

    /// Make `registry` hold exactly this scene's mixins.
    ///
    /// Unchanged mixins are left alone, so memoized resolutions of entities
    /// that only use them stay valid only if nothing else changed.
    pub fn sync_mixins(&self, registry: &MixinRegistry) -> MixinSync {
        let mut sync = MixinSync::default();
        for mixin in &self.mixins {
            let id = mixin.id().to_string();
            match registry.register(mixin.clone()) {
                Registration::Created => sync.created.push(id),
                Registration::Redefined => sync.redefined.push(id),
                Registration::Unchanged => {}
            }
        }
        for id in registry.ids() {
            if !self.mixins.iter().any(|m| m.id() == id) {
                registry.deregister(&id);
                sync.removed.push(id);
            }
        }
        sync
    }
}

/// Load a scene from a TOML file
pub fn load_scene<P: AsRef<Path>>(path: P, schemas: &SchemaRegistry) -> Result<LoadedScene> {
    let content = fs::read_to_string(path)?;
    load_scene_string(&content, schemas)
}

/// Load a scene from a TOML string
pub fn load_scene_string(content: &str, schemas: &SchemaRegistry) -> Result<LoadedScene> {
    let scene_file: SceneFile = toml::from_str(content)?;
    let mut diagnostics = Vec::new();

    let mut mixins = Vec::with_capacity(scene_file.mixins.len());
    for (id, table) in &scene_file.mixins {
        let mut pairs = Vec::with_capacity(table.len());
        for (key, value) in table {
            if key == MIXIN_ATTRIBUTE {
                tracing::warn!(mixin = %id, "mixins cannot reference other mixins, ignoring 'mixin' key");
                continue;
            }
            match attribute_text(value) {
                Some(raw) => pairs.push((key.as_str(), raw)),
                None => diagnostics.push(Diagnostic::MalformedAttributeString {
                    owner: id.clone(),
                    attribute: key.clone(),
                    input: value.to_string(),
                    reason: format!("a {} has no attribute form", value.type_str()),
                }),
            }
        }
        let (mixin, found) =
            Mixin::declare(id.as_str(), pairs.iter().map(|(k, v)| (*k, v.as_str())), schemas);
        diagnostics.extend(found);
        mixins.push(mixin);
    }

    let mut entities = Vec::with_capacity(scene_file.entities.len());
    for (name, def) in &scene_file.entities {
        let (decl, found) = expand_entity(name, def, schemas)?;
        diagnostics.extend(found);
        entities.push(decl);
    }

    for diagnostic in &diagnostics {
        tracing::warn!("{}", diagnostic);
    }
    tracing::info!(
        scene = %scene_file.scene.name,
        mixins = mixins.len(),
        entities = entities.len(),
        diagnostics = diagnostics.len(),
        "loaded scene"
    );

    Ok(LoadedScene {
        metadata: scene_file.scene,
        config: scene_file.resolver,
        mixins,
        entities,
        diagnostics,
    })
}
