//! Scene check command

use super::{effective_config, load_schemas};
use anyhow::{Context, Result};
use trellis_resolve::{Diagnostics, EntityAttributeResolver, ResolveMode, Severity};
use trellis_scene::load_scene;

pub struct CheckArgs {
    pub scene: String,
    pub mode: Option<ResolveMode>,
    pub schemas: Vec<String>,
    pub format: String,
}

/// Outcome of checking one scene
struct CheckReport {
    diagnostics: Diagnostics,
    /// Entities whose resolution failed outright (strict mode)
    failures: Vec<(String, String)>,
}

impl CheckReport {
    fn is_valid(&self) -> bool {
        self.failures.is_empty() && self.diagnostics.is_valid()
    }

    fn summary(&self) -> String {
        if self.failures.is_empty() {
            self.diagnostics.summary()
        } else {
            format!(
                "{} entity failure(s); {}",
                self.failures.len(),
                self.diagnostics.summary()
            )
        }
    }
}

pub fn run(args: CheckArgs) -> Result<()> {
    let (schemas, schema_diagnostics) = load_schemas(&args.schemas)?;
    let scene = load_scene(&args.scene, &schemas)
        .with_context(|| format!("Failed to load scene {}", args.scene))?;
    let config = effective_config(scene.config, args.mode);
    let mixins = scene.mixin_registry();
    let resolver = EntityAttributeResolver::new(&schemas, &mixins, config);

    let mut report = CheckReport {
        diagnostics: schema_diagnostics
            .into_iter()
            .chain(scene.diagnostics.iter().cloned())
            .collect(),
        failures: Vec::new(),
    };
    for (entity, result) in scene.entities.iter().zip(resolver.resolve_all(&scene.entities)) {
        match result {
            Ok(resolution) => report.diagnostics.extend(resolution.diagnostics),
            Err(e) => report
                .failures
                .push((entity.name().to_string(), e.to_string())),
        }
    }

    if args.format == "json" {
        print_report_json(&report)?;
    } else {
        print_report_text(&report);
    }

    if !report.is_valid() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report_text(report: &CheckReport) {
    if report.diagnostics.is_empty() && report.failures.is_empty() {
        println!("All attributes resolved cleanly.");
        return;
    }

    println!("{}", report.summary());
    println!();

    for (entity, error) in &report.failures {
        println!("  [FAIL ] {}: {}", entity, error);
    }

    for diagnostic in report.diagnostics.iter() {
        let severity_str = match diagnostic.severity() {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
            Severity::Info => "INFO ",
        };
        println!("  [{}] {}", severity_str, diagnostic);
    }
}

fn print_report_json(report: &CheckReport) -> Result<()> {
    let diagnostics: Vec<serde_json::Value> = report
        .diagnostics
        .iter()
        .map(|d| {
            serde_json::json!({
                "severity": d.severity(),
                "message": d.to_string(),
                "detail": d,
            })
        })
        .collect();
    let failures: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|(entity, error)| serde_json::json!({ "entity": entity, "error": error }))
        .collect();

    let output = serde_json::json!({
        "valid": report.is_valid(),
        "summary": report.summary(),
        "errors": report.diagnostics.error_count(),
        "warnings": report.diagnostics.warning_count(),
        "info": report.diagnostics.info_count(),
        "failures": failures,
        "diagnostics": diagnostics,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
