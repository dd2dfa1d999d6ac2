//! Raw attribute text to typed values

use crate::component::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use trellis_core::{Color, Result, TrellisError, Vec2, Vec3};

/// A selector value: either a `#id` reference to a shared asset or an inline literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SelectorRef {
    Reference(String),
    Literal(String),
}

impl SelectorRef {
    pub fn is_reference(&self) -> bool {
        matches!(self, SelectorRef::Reference(_))
    }
}

impl fmt::Display for SelectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorRef::Reference(id) => write!(f, "#{}", id),
            SelectorRef::Literal(s) => write!(f, "{}", s),
        }
    }
}

/// A property value after coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Number(f64),
    #[serde(rename = "int")]
    Integer(i64),
    Boolean(bool),
    String(String),
    Enum(String),
    #[serde(rename = "vec2")]
    Vector2(Vec2),
    #[serde(rename = "vec3")]
    Vector3(Vec3),
    Color(Color),
    Selector(SelectorRef),
    Array(Vec<String>),
}

impl TypedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            TypedValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String and enum values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) | TypedValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            TypedValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            TypedValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> Option<&SelectorRef> {
        match self {
            TypedValue::Selector(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders back to attribute syntax
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Number(n) => write!(f, "{}", n),
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::String(s) | TypedValue::Enum(s) => write!(f, "{}", s),
            TypedValue::Vector2(v) => write!(f, "{}", v),
            TypedValue::Vector3(v) => write!(f, "{}", v),
            TypedValue::Color(c) => write!(f, "{}", c),
            TypedValue::Selector(s) => write!(f, "{}", s),
            TypedValue::Array(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Convert a raw attribute value into a typed value.
///
/// Leading and trailing whitespace is ignored for every type except `String`,
/// which keeps the raw text as given.
pub fn coerce(raw: &str, value_type: &ValueType) -> Result<TypedValue> {
    let s = raw.trim();
    let fail = |reason: String| TrellisError::invalid_value(raw, value_type.type_name(), reason);

    match value_type {
        ValueType::Number => parse_number(s).map(TypedValue::Number).map_err(fail),
        ValueType::Integer => s
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|e| fail(e.to_string())),
        ValueType::Boolean => {
            if s.eq_ignore_ascii_case("true") {
                Ok(TypedValue::Boolean(true))
            } else if s.eq_ignore_ascii_case("false") {
                Ok(TypedValue::Boolean(false))
            } else {
                Err(fail("expected true or false".to_string()))
            }
        }
        ValueType::String => Ok(TypedValue::String(raw.to_string())),
        ValueType::Enum { values } => {
            if values.iter().any(|v| v == s) {
                Ok(TypedValue::Enum(s.to_string()))
            } else {
                Err(fail(format!("expected one of [{}]", values.join(", "))))
            }
        }
        ValueType::Vector2 => {
            let [x, y] = parse_components::<2>(s).map_err(fail)?;
            Ok(TypedValue::Vector2(Vec2::new(x, y)))
        }
        ValueType::Vector3 => {
            let arr = parse_components::<3>(s).map_err(fail)?;
            Ok(TypedValue::Vector3(Vec3::from_array(arr)))
        }
        ValueType::Color => Color::parse(s)
            .map(TypedValue::Color)
            .map_err(|e| fail(e.to_string())),
        ValueType::Selector => match s.strip_prefix('#') {
            Some("") => Err(fail("empty selector reference".to_string())),
            Some(id) => Ok(TypedValue::Selector(SelectorRef::Reference(id.to_string()))),
            None => Ok(TypedValue::Selector(SelectorRef::Literal(s.to_string()))),
        },
        ValueType::Array => Ok(TypedValue::Array(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}

fn parse_number(s: &str) -> std::result::Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "not a number".to_string())?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err("number must be finite".to_string())
    }
}

fn parse_components<const N: usize>(s: &str) -> std::result::Result<[f64; N], String> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() != N {
        return Err(format!(
            "expected {} numeric components, found {}",
            N,
            tokens.len()
        ));
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = parse_number(token).map_err(|e| format!("component '{}': {}", token, e))?;
    }
    Ok(out)
}
