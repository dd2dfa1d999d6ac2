//! Built-in component and primitive catalog

use crate::registry::SchemaRegistry;
use trellis_core::Result;

const BUILTIN_COMPONENTS: &str = include_str!("../schemas/components.toml");
const BUILTIN_PRIMITIVES: &str = include_str!("../schemas/primitives.toml");

impl SchemaRegistry {
    /// A registry preloaded with the built-in components and primitives
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        registry.load_component_string(BUILTIN_COMPONENTS)?;
        registry.load_primitive_string(BUILTIN_PRIMITIVES)?;
        tracing::debug!(
            components = registry.component_names().len(),
            primitives = registry.primitive_names().len(),
            "loaded built-in schemas"
        );
        Ok(registry)
    }
}
