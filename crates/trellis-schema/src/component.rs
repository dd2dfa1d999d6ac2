//! Component schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trellis_core::{Result, TrellisError};

/// Property name used for the value of a single-property component
pub const SINGLE_PROPERTY: &str = "value";

/// The type of a property in a component schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    #[serde(rename = "int")]
    Integer,
    Boolean,
    String,
    #[serde(rename = "enum")]
    Enum { values: Vec<String> },
    #[serde(rename = "vec2")]
    Vector2,
    #[serde(rename = "vec3")]
    Vector3,
    Color,
    Selector,
    Array,
}

impl ValueType {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Integer => "int",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Enum { .. } => "enum",
            ValueType::Vector2 => "vec2",
            ValueType::Vector3 => "vec3",
            ValueType::Color => "color",
            ValueType::Selector => "selector",
            ValueType::Array => "array",
        }
    }
}

/// Schema for a single property within a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Raw default, coerced through the same path as user values
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// How a component's attribute string maps onto properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaKind {
    /// `key: value; key2: value2` with declared, ordered properties
    Multiple { properties: Vec<PropertySchema> },
    /// The whole attribute string is one value, e.g. `position="1 2 3"`
    Single { property: PropertySchema },
    /// Unknown component type passed through untyped: any key, string values, no defaults
    Lenient,
}

/// Schema definition for a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SchemaKind,
}

impl ComponentSchema {
    pub fn multiple(name: impl Into<String>, properties: Vec<PropertySchema>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SchemaKind::Multiple { properties },
        }
    }

    pub fn single(name: impl Into<String>, value_type: ValueType, default: Option<&str>) -> Self {
        let mut property = PropertySchema::new(SINGLE_PROPERTY, value_type);
        property.default = default.map(str::to_string);
        Self {
            name: name.into(),
            description: None,
            kind: SchemaKind::Single { property },
        }
    }

    /// The pass-through schema used for component types nobody registered
    pub fn lenient(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SchemaKind::Lenient,
        }
    }

    /// Declared properties in declaration order (empty for lenient schemas)
    pub fn properties(&self) -> &[PropertySchema] {
        match &self.kind {
            SchemaKind::Multiple { properties } => properties,
            SchemaKind::Single { property } => std::slice::from_ref(property),
            SchemaKind::Lenient => &[],
        }
    }

    /// Get a property schema by name
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties().iter().find(|p| p.name == name)
    }

    pub fn is_single(&self) -> bool {
        matches!(self.kind, SchemaKind::Single { .. })
    }

    pub fn is_lenient(&self) -> bool {
        matches!(self.kind, SchemaKind::Lenient)
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties().iter().map(|p| p.name.as_str()).collect()
    }
}

/// TOML file format for component schemas
#[derive(Debug, Deserialize)]
pub struct ComponentSchemaFile {
    pub component: HashMap<String, ComponentSchemaDefinition>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    #[default]
    Multiple,
    Single,
}

#[derive(Debug, Deserialize)]
pub struct ComponentSchemaDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: DefinitionKind,
    /// Value type of a single-property component
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<toml::Value>,
    /// Properties of a multi-property component, in document order
    #[serde(default)]
    pub properties: toml::Table,
}

/// Property definition as it appears in TOML files
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertySchemaDefinition {
    Simple(String),
    Detailed(DetailedPropertySchema),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedPropertySchema {
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<toml::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ComponentSchemaDefinition {
    pub fn to_component_schema(self, name: String) -> Result<ComponentSchema> {
        let kind = match self.kind {
            DefinitionKind::Single => {
                let type_str = self.value_type.as_deref().ok_or_else(|| {
                    TrellisError::InvalidSchema(format!(
                        "single-property component '{}' needs a type",
                        name
                    ))
                })?;
                let mut property = PropertySchema::new(
                    SINGLE_PROPERTY,
                    parse_value_type(type_str, self.values.as_ref(), &name)?,
                );
                property.default = self.default.as_ref().map(default_to_raw).transpose()?;
                property.description = self.description.clone();
                SchemaKind::Single { property }
            }
            DefinitionKind::Multiple => {
                if self.value_type.is_some() {
                    return Err(TrellisError::InvalidSchema(format!(
                        "component '{}' declares a type but is not kind = \"single\"",
                        name
                    )));
                }
                let mut properties = Vec::with_capacity(self.properties.len());
                for (prop_name, value) in self.properties {
                    let def: PropertySchemaDefinition = value.try_into().map_err(|e| {
                        TrellisError::InvalidSchema(format!("{}.{}: {}", name, prop_name, e))
                    })?;
                    properties.push(def.to_property_schema(prop_name, &name)?);
                }
                SchemaKind::Multiple { properties }
            }
        };

        Ok(ComponentSchema {
            name,
            description: self.description,
            kind,
        })
    }
}

impl PropertySchemaDefinition {
    pub fn to_property_schema(self, name: String, component: &str) -> Result<PropertySchema> {
        let context = format!("{}.{}", component, name);
        match self {
            PropertySchemaDefinition::Simple(type_str) => Ok(PropertySchema {
                value_type: parse_value_type(&type_str, None, &context)?,
                name,
                default: None,
                description: None,
            }),
            PropertySchemaDefinition::Detailed(d) => Ok(PropertySchema {
                value_type: parse_value_type(&d.value_type, d.values.as_ref(), &context)?,
                default: d.default.as_ref().map(default_to_raw).transpose()?,
                description: d.description,
                name,
            }),
        }
    }
}

fn parse_value_type(
    type_str: &str,
    enum_values: Option<&Vec<String>>,
    context: &str,
) -> Result<ValueType> {
    let value_type = match type_str {
        "number" => ValueType::Number,
        "int" => ValueType::Integer,
        "boolean" => ValueType::Boolean,
        "string" => ValueType::String,
        "vec2" => ValueType::Vector2,
        "vec3" => ValueType::Vector3,
        "color" => ValueType::Color,
        "selector" => ValueType::Selector,
        "array" => ValueType::Array,
        "enum" => match enum_values {
            Some(values) if !values.is_empty() => ValueType::Enum {
                values: values.clone(),
            },
            _ => {
                return Err(TrellisError::InvalidSchema(format!(
                    "{}: enum needs a non-empty `values` list",
                    context
                )))
            }
        },
        other => {
            return Err(TrellisError::InvalidSchema(format!(
                "{}: unknown type '{}'",
                context, other
            )))
        }
    };
    Ok(value_type)
}

/// Defaults are raw attribute text; TOML scalars are accepted and stringified.
fn default_to_raw(value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(TrellisError::InvalidSchema(format!(
            "default must be a string or scalar, got {}",
            other.type_str()
        ))),
    }
}
