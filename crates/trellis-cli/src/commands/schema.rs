//! Schema introspection command

use super::{load_schemas, print_diagnostics};
use anyhow::Result;
use trellis_schema::{ComponentSchema, PrimitiveSchema, SchemaKind, ValueType};

pub fn run(name: &str, schema_dirs: &[String]) -> Result<()> {
    let (registry, diagnostics) = load_schemas(schema_dirs)?;
    print_diagnostics(&diagnostics);

    // Try component first, then primitive
    if let Some(component) = registry.get_component(name) {
        print_component(component);
        return Ok(());
    }

    if let Some(primitive) = registry.get_primitive(name) {
        print_primitive(primitive);
        return Ok(());
    }

    // List available schemas
    println!("Schema '{}' not found.", name);
    println!();

    let components = registry.component_names();
    let primitives = registry.primitive_names();

    if !components.is_empty() {
        println!("Available components:");
        for c in components {
            println!("  - {}", c);
        }
    }

    if !primitives.is_empty() {
        println!();
        println!("Available primitives:");
        for p in primitives {
            println!("  - {}", p);
        }
    }

    Ok(())
}

fn print_component(component: &ComponentSchema) {
    println!("Component: {}", component.name);
    if let Some(desc) = &component.description {
        println!("Description: {}", desc);
    }
    println!();

    match &component.kind {
        SchemaKind::Single { property } => {
            print!("Value : {}", format_value_type(&property.value_type));
            if let Some(default) = &property.default {
                print!(" = \"{}\"", default);
            }
            println!();
        }
        SchemaKind::Multiple { properties } => {
            println!("Properties:");
            for property in properties {
                print!(
                    "  {} : {}",
                    property.name,
                    format_value_type(&property.value_type)
                );
                if let Some(default) = &property.default {
                    print!(" = \"{}\"", default);
                }
                println!();
                if let Some(desc) = &property.description {
                    println!("    # {}", desc);
                }
            }
        }
        SchemaKind::Lenient => println!("Any property, untyped"),
    }
}

fn print_primitive(primitive: &PrimitiveSchema) {
    println!("Primitive: {}", primitive.name);
    if let Some(desc) = &primitive.description {
        println!("Description: {}", desc);
    }

    if !primitive.components.is_empty() {
        println!();
        println!("Default components:");
        for (component, raw) in &primitive.components {
            println!("  {} = \"{}\"", component, raw);
        }
    }

    if !primitive.mappings.is_empty() {
        println!();
        println!("Attributes:");
        for mapping in &primitive.mappings {
            println!("  {} -> {}", mapping.attribute, mapping.target());
        }
    }
}

fn format_value_type(vt: &ValueType) -> String {
    match vt {
        ValueType::Enum { values } => format!("enum[{}]", values.join(", ")),
        other => other.type_name().to_string(),
    }
}
