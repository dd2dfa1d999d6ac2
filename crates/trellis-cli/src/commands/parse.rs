//! Attribute string parsing command

use super::{load_schemas, print_diagnostics};
use anyhow::{Context, Result};
use trellis_resolve::{
    parse, split, EntityAttributeResolver, EntityDecl, MixinRegistry, ResolverConfig,
};

pub fn run(input: &str, component: Option<&str>, schema_dirs: &[String], format: &str) -> Result<()> {
    let Some(component) = component else {
        let map = parse(input).context("Failed to parse attribute string")?;
        if format == "json" {
            let object: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
        } else {
            for (k, v) in map.iter() {
                println!("{} = {}", k, v);
            }
        }
        return Ok(());
    };

    // Resolve a one-component entity so defaults and coercion apply.
    let (schemas, schema_diagnostics) = load_schemas(schema_dirs)?;
    print_diagnostics(&schema_diagnostics);
    let mixins = MixinRegistry::new();
    let mut entity = EntityDecl::new("input");
    entity
        .set_attribute(component, input, &schemas)
        .context("Failed to parse attribute string")?;
    let resolver = EntityAttributeResolver::new(&schemas, &mixins, ResolverConfig::default());
    let resolution = resolver.resolve(&entity)?;
    let resolved = resolution
        .component(&split(component))
        .context("Component produced no configuration")?;

    if format == "json" {
        let output = serde_json::json!({
            "component": resolved,
            "diagnostics": resolution.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (name, value) in resolved.properties() {
            println!("{} = {}", name, value);
        }
        for diagnostic in &resolution.diagnostics {
            eprintln!("{}: {}", diagnostic.severity(), diagnostic);
        }
    }

    Ok(())
}
