pub mod check;
pub mod parse;
pub mod resolve;
pub mod schema;

use anyhow::{Context, Result};
use std::path::Path;
use trellis_resolve::{Diagnostic, ResolveMode, ResolverConfig};
use trellis_schema::SchemaRegistry;

/// Built-in schemas plus every extra directory, in order.
///
/// A name that is already registered keeps its first definition and comes
/// back as a `DuplicateSchema` diagnostic.
pub fn load_schemas(dirs: &[String]) -> Result<(SchemaRegistry, Vec<Diagnostic>)> {
    let mut registry = SchemaRegistry::with_builtins().context("Failed to load built-in schemas")?;
    let mut diagnostics = Vec::new();
    for dir in dirs {
        if !Path::new(dir).exists() {
            anyhow::bail!("Schemas directory not found: {}", dir);
        }
        let skipped = registry
            .merge_directory(dir)
            .with_context(|| format!("Failed to load schemas from {}", dir))?;
        diagnostics.extend(skipped.into_iter().map(|name| Diagnostic::DuplicateSchema { name }));
    }
    tracing::debug!(
        components = registry.component_names().len(),
        primitives = registry.primitive_names().len(),
        duplicates = diagnostics.len(),
        "schemas ready"
    );
    Ok((registry, diagnostics))
}

/// Print diagnostics to stderr for commands without a report of their own
pub fn print_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        eprintln!("{}: {}", diagnostic.severity(), diagnostic);
    }
}

pub fn mode_override(strict: bool, lenient: bool) -> Option<ResolveMode> {
    match (strict, lenient) {
        (true, _) => Some(ResolveMode::Strict),
        (_, true) => Some(ResolveMode::Lenient),
        _ => None,
    }
}

/// The scene's `[resolver]` config with any command-line override applied
pub fn effective_config(scene: ResolverConfig, mode: Option<ResolveMode>) -> ResolverConfig {
    match mode {
        Some(mode) => ResolverConfig { mode },
        None => scene,
    }
}
