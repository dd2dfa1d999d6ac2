//! Scene resolution command

use super::{effective_config, load_schemas, print_diagnostics};
use anyhow::{Context, Result};
use trellis_resolve::{EntityAttributeResolver, EntityResolution, ResolveMode};
use trellis_scene::load_scene;

pub struct ResolveArgs {
    pub scene: String,
    pub entity: Option<String>,
    pub format: String,
    pub mode: Option<ResolveMode>,
    pub schemas: Vec<String>,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let (schemas, schema_diagnostics) = load_schemas(&args.schemas)?;
    let scene = load_scene(&args.scene, &schemas)
        .with_context(|| format!("Failed to load scene {}", args.scene))?;
    let config = effective_config(scene.config, args.mode);
    let mixins = scene.mixin_registry();
    let resolver = EntityAttributeResolver::new(&schemas, &mixins, config);

    let entities = match &args.entity {
        Some(name) => vec![scene
            .entity(name)
            .with_context(|| format!("Entity '{}' not found in {}", name, args.scene))?
            .clone()],
        None => scene.entities.clone(),
    };

    let mut resolutions = Vec::with_capacity(entities.len());
    for (entity, result) in entities.iter().zip(resolver.resolve_all(&entities)) {
        let resolution =
            result.with_context(|| format!("Failed to resolve entity '{}'", entity.name()))?;
        resolutions.push(resolution);
    }

    print_diagnostics(schema_diagnostics.iter().chain(&scene.diagnostics));

    match args.format.as_str() {
        "json" => {
            let output = if args.entity.is_some() && resolutions.len() == 1 {
                serde_json::to_string_pretty(&resolutions[0])?
            } else {
                serde_json::to_string_pretty(&resolutions)?
            };
            println!("{}", output);
        }
        "toml" => {
            let table = to_toml_table(&resolutions);
            print!("{}", toml::to_string_pretty(&table)?);
        }
        _ => print_text(&resolutions),
    }

    Ok(())
}

fn print_text(resolutions: &[EntityResolution]) {
    for (i, resolution) in resolutions.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", resolution.entity);
        for component in &resolution.components {
            let untyped = if component.typed { "" } else { " (untyped)" };
            println!("  {}{}", component.key, untyped);
            for (name, value) in component.properties() {
                println!("    {} = {}", name, value);
            }
        }
        for diagnostic in &resolution.diagnostics {
            eprintln!("{}: {}", diagnostic.severity(), diagnostic);
        }
    }
}

/// `[entity.component] property = "attribute text"`
fn to_toml_table(resolutions: &[EntityResolution]) -> toml::Table {
    let mut root = toml::Table::new();
    for resolution in resolutions {
        let mut entity = toml::Table::new();
        for component in &resolution.components {
            let properties: toml::Table = component
                .properties()
                .map(|(name, value)| (name.to_string(), toml::Value::String(value.to_string())))
                .collect();
            entity.insert(component.key.to_string(), toml::Value::Table(properties));
        }
        root.insert(resolution.entity.clone(), toml::Value::Table(entity));
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_resolve::{split, EntityDecl, MixinRegistry, ResolverConfig};
    use trellis_schema::SchemaRegistry;

    #[test]
    fn test_toml_output_uses_attribute_text() {
        let schemas = SchemaRegistry::with_builtins().unwrap();
        let mixins = MixinRegistry::new();
        let mut entity = EntityDecl::new("crate");
        entity.set_attribute("position", "0 1.5 -3", &schemas).unwrap();
        entity.set_attribute("pool__enemy", "size: 4", &schemas).unwrap();
        let resolution = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default())
            .resolve(&entity)
            .unwrap();
        assert!(resolution.component(&split("pool__enemy")).is_some());

        let table = to_toml_table(&[resolution]);
        let position = &table["crate"]["position"]["value"];
        assert_eq!(position.as_str(), Some("0 1.5 -3"));
        assert_eq!(table["crate"]["pool__enemy"]["size"].as_str(), Some("4"));

        let text = toml::to_string_pretty(&table).unwrap();
        assert!(text.contains("[crate.pool__enemy]"));
    }
}
