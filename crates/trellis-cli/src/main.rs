//! Trellis CLI - Command-line interface for the Trellis attribute engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, parse, resolve, schema};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Resolve component attribute strings, mixins, and schemas", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show schema information for a component or primitive
    Schema {
        /// Component or primitive name
        name: String,

        /// Extra schema directories (with components/ and primitives/)
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// Parse an attribute string
    Parse {
        /// Attribute string, e.g. "color: red; side: double"
        input: String,

        /// Read and coerce the string as this component (e.g. material, position, pool__enemy)
        #[arg(long)]
        component: Option<String>,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Resolve the entities of a scene file
    Resolve {
        /// Path to scene file
        scene: String,

        /// Only resolve this entity
        #[arg(long)]
        entity: Option<String>,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text", value_parser = ["text", "json", "toml"])]
        format: String,

        /// Fail on component types without a schema
        #[arg(long, conflicts_with = "lenient")]
        strict: bool,

        /// Pass component types without a schema through untyped
        #[arg(long)]
        lenient: bool,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// Check a scene and report diagnostics; exits 1 on errors
    Check {
        /// Path to scene file
        scene: String,

        /// Fail on component types without a schema
        #[arg(long, conflicts_with = "lenient")]
        strict: bool,

        /// Pass component types without a schema through untyped
        #[arg(long)]
        lenient: bool,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Schema { name, schemas } => schema::run(&name, &schemas),
        Commands::Parse {
            input,
            component,
            schemas,
            format,
        } => parse::run(&input, component.as_deref(), &schemas, &format),
        Commands::Resolve {
            scene,
            entity,
            format,
            strict,
            lenient,
            schemas,
        } => resolve::run(resolve::ResolveArgs {
            scene,
            entity,
            format,
            mode: commands::mode_override(strict, lenient),
            schemas,
        }),
        Commands::Check {
            scene,
            strict,
            lenient,
            schemas,
            format,
        } => check::run(check::CheckArgs {
            scene,
            mode: commands::mode_override(strict, lenient),
            schemas,
            format,
        }),
    }
}
