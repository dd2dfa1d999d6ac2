//! Primitive schema definitions
//!
//! A primitive is a named element type (`a-box`, `a-sky`, ...) that bundles
//! default component attribute strings with a table of convenience attributes
//! mapped onto component properties.

use crate::component::SINGLE_PROPERTY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trellis_core::{Result, TrellisError};

/// Where a primitive attribute lands: `color` -> `material.color`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub attribute: String,
    pub component: String,
    /// `None` targets a single-property component as a whole
    pub property: Option<String>,
}

impl AttributeMapping {
    /// Parse a `component.property` or bare `component` target
    pub fn parse(attribute: &str, target: &str) -> Result<Self> {
        let (component, property) = match target.split_once('.') {
            Some((c, p)) => (c, Some(p)),
            None => (target, None),
        };
        if component.is_empty() || property.is_some_and(str::is_empty) {
            return Err(TrellisError::InvalidSchema(format!(
                "mapping '{}' has malformed target '{}'",
                attribute, target
            )));
        }
        Ok(Self {
            attribute: attribute.to_string(),
            component: component.to_string(),
            property: property.map(str::to_string),
        })
    }

    /// Property name inside the component's resolved config
    pub fn property_name(&self) -> &str {
        self.property.as_deref().unwrap_or(SINGLE_PROPERTY)
    }

    pub fn target(&self) -> String {
        match &self.property {
            Some(p) => format!("{}.{}", self.component, p),
            None => self.component.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSchema {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default component attribute strings, lowest precedence
    #[serde(default)]
    pub components: Vec<(String, String)>,
    #[serde(default)]
    pub mappings: Vec<AttributeMapping>,
}

impl PrimitiveSchema {
    pub fn mapping(&self, attribute: &str) -> Option<&AttributeMapping> {
        self.mappings.iter().find(|m| m.attribute == attribute)
    }

    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|(c, _)| c == component)
    }
}

/// TOML file format for primitive schemas
#[derive(Debug, Deserialize)]
pub struct PrimitiveSchemaFile {
    pub primitive: HashMap<String, PrimitiveSchemaDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct PrimitiveSchemaDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub components: toml::Table,
    #[serde(default)]
    pub mappings: toml::Table,
}

impl PrimitiveSchemaDefinition {
    pub fn to_primitive_schema(self, name: String) -> Result<PrimitiveSchema> {
        let components = self
            .components
            .into_iter()
            .map(|(component, value)| match value {
                toml::Value::String(raw) => Ok((component, raw)),
                other => Err(TrellisError::InvalidSchema(format!(
                    "{}: default for component '{}' must be an attribute string, got {}",
                    name,
                    component,
                    other.type_str()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let mappings = self
            .mappings
            .into_iter()
            .map(|(attribute, value)| match value.as_str() {
                Some(target) => AttributeMapping::parse(&attribute, target),
                None => Err(TrellisError::InvalidSchema(format!(
                    "{}: mapping for '{}' must be a string",
                    name, attribute
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PrimitiveSchema {
            name,
            description: self.description,
            components,
            mappings,
        })
    }
}
