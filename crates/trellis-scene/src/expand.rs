//! Expansion of scene entity definitions into entity declarations
//!
//! For an entity with a primitive, the primitive's default components become
//! the lowest layer of the declaration, attributes named in its mapping table
//! set single component properties on top of the entity's own component
//! strings, and everything else is read as a component attribute.

use crate::format::{attribute_text, EntityDef};
use trellis_core::Result;
use trellis_resolve::{parse_for_schema, parse_mixin_list, split, ComponentKey, Diagnostic, EntityDecl};
use trellis_schema::{PrimitiveSchema, SchemaRegistry};

/// Build the declaration for one scene entity.
///
/// Fails only if the entity names a primitive that is not registered.
/// Malformed attribute strings are dropped and reported.
pub fn expand_entity(
    name: &str,
    def: &EntityDef,
    schemas: &SchemaRegistry,
) -> Result<(EntityDecl, Vec<Diagnostic>)> {
    let primitive = def
        .primitive
        .as_deref()
        .map(|p| schemas.lookup_primitive(p))
        .transpose()?;

    let mut decl = EntityDecl::new(name);
    let mut diagnostics = Vec::new();

    if let Some(primitive) = primitive {
        apply_primitive_defaults(&mut decl, primitive, schemas, &mut diagnostics);
    }
    if let Some(mixin) = &def.mixin {
        decl.set_mixins(parse_mixin_list(mixin));
    }

    let mut mapped = Vec::new();
    for (key, value) in &def.attributes {
        let Some(raw) = attribute_text(value) else {
            diagnostics.push(Diagnostic::MalformedAttributeString {
                owner: name.to_string(),
                attribute: key.clone(),
                input: value.to_string(),
                reason: format!("a {} has no attribute form", value.type_str()),
            });
            continue;
        };

        if let Some(mapping) = primitive.and_then(|p| p.mapping(key)) {
            mapped.push((mapping, raw));
            continue;
        }

        if let Err(e) = decl.set_attribute(key, &raw, schemas) {
            diagnostics.push(Diagnostic::MalformedAttributeString {
                owner: name.to_string(),
                attribute: key.clone(),
                input: raw,
                reason: e.to_string(),
            });
        }
    }

    // Mapped attributes are the most specific source and go last.
    for (mapping, raw) in mapped {
        decl.set_property(
            ComponentKey::new(mapping.component.as_str()),
            mapping.property_name(),
            &raw,
        );
    }

    Ok((decl, diagnostics))
}

fn apply_primitive_defaults(
    decl: &mut EntityDecl,
    primitive: &PrimitiveSchema,
    schemas: &SchemaRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (component, raw) in &primitive.components {
        let key = split(component);
        match parse_for_schema(raw, schemas.get_component(&key.base)) {
            Ok(map) => decl.set_default_component(key, map),
            Err(e) => diagnostics.push(Diagnostic::MalformedAttributeString {
                owner: primitive.name.clone(),
                attribute: component.clone(),
                input: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
