use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{GenerateConfig, Overrides};
use crate::generator::{build_table, generate};
use crate::scanner::{GrammarKind, RouteTable};

/// Command-line interface for routegen
#[derive(Parser, Debug)]
#[command(name = "routegen")]
#[command(version, about = "Generate route registration glue from annotated handlers", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan handlers and write the generated route module
    Generate {
        /// Crate root containing Cargo.toml
        #[arg(long, env = "ROUTEGEN_ROOT", default_value = ".")]
        root: PathBuf,

        /// Entry file the generated module is placed next to
        #[arg(long, env = "ROUTEGEN_ENTRY")]
        entry: Option<PathBuf>,

        /// Directory of handler sources, under <root>/src
        #[arg(long, env = "ROUTEGEN_HANDLER")]
        handler: Option<PathBuf>,

        /// Annotation grammar
        #[arg(long, value_enum, env = "ROUTEGEN_GRAMMAR")]
        grammar: Option<GrammarKind>,

        /// Marker token opening a route directive
        #[arg(long)]
        marker: Option<String>,

        /// Print the generated module instead of writing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the scanned route table
    Routes {
        /// Crate root containing Cargo.toml
        #[arg(long, env = "ROUTEGEN_ROOT", default_value = ".")]
        root: PathBuf,

        /// Directory of handler sources, under <root>/src
        #[arg(long, env = "ROUTEGEN_HANDLER")]
        handler: Option<PathBuf>,

        /// Annotation grammar
        #[arg(long, value_enum, env = "ROUTEGEN_GRAMMAR")]
        grammar: Option<GrammarKind>,

        /// Marker token opening a route directive
        #[arg(long)]
        marker: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TableFormat::Json)]
        format: TableFormat,
    },
}

/// Serialisation used by `routegen routes`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Json,
    Yaml,
}

/// Serialise a route table for display
///
/// # Errors
///
/// Serialisation failures from `serde_json` or `serde_yaml`.
pub fn render_table(table: &RouteTable, format: TableFormat) -> Result<String> {
    match format {
        TableFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(table).context("Failed to serialize route table")?;
            out.push('\n');
            Ok(out)
        }
        TableFormat::Yaml => serde_yaml::to_string(table).context("Failed to serialize route table"),
    }
}

/// Execute a parsed command
///
/// # Errors
///
/// Returns an error if:
/// - the root, manifest, entry or handler directory is invalid
/// - a source file cannot be parsed or carries a malformed directive
/// - rendering, formatting or writing the module fails
/// - stdout is closed
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            root,
            entry,
            handler,
            grammar,
            marker,
            dry_run,
        } => {
            let config = GenerateConfig::resolve(
                &root,
                Overrides {
                    entry,
                    handler,
                    grammar,
                    marker,
                },
            )
            .with_context(|| format!("Invalid configuration for {}", root.display()))?;
            let outcome = generate(&config, dry_run)
                .with_context(|| format!("Failed to generate routes for {}", config.package_name))?;

            if outcome.written {
                println!(
                    "✅ Generated {} ({} controllers, {} routes)",
                    outcome.output.display(),
                    outcome.table.controllers().count(),
                    outcome.table.route_count()
                );
            } else {
                io::stdout()
                    .write_all(outcome.source.as_bytes())
                    .context("Failed to write to stdout")?;
            }
            Ok(())
        }
        Commands::Routes {
            root,
            handler,
            grammar,
            marker,
            format,
        } => {
            let config = GenerateConfig::resolve(
                &root,
                Overrides {
                    entry: None,
                    handler,
                    grammar,
                    marker,
                },
            )
            .with_context(|| format!("Invalid configuration for {}", root.display()))?;
            let table = build_table(&config).context("Failed to scan handlers")?;
            io::stdout()
                .write_all(render_table(&table, format)?.as_bytes())
                .context("Failed to write to stdout")?;
            Ok(())
        }
    }
}
