//! # Generator Module
//!
//! Turns a scanned [`RouteTable`] into the `routegen_gen.rs` module that sits
//! next to the crate's entry file.
//!
//! ## Pipeline
//!
//! ```text
//! handler dir ─ scan ─▶ RouteTable ─ askama ─▶ source ─ syn + prettyplease ─▶ formatted ─ tempfile ─▶ routegen_gen.rs
//! ```
//!
//! Each stage is fatal: a template, format or write failure leaves any
//! previous output untouched.
//!
//! ## Generated module
//!
//! For a controller like
//!
//! ```ignore
//! impl UserController {
//!     //routegen:api GET /users/:id
//!     fn get(&self, id: Path<i64>) -> JsonResponse<User> { .. }
//! }
//! ```
//!
//! the generated module exposes
//!
//! - `SOURCE_MODULES`, the module paths that contributed handlers;
//! - `register_user_controller(&mut DispatchTable, Arc<UserController>)`, which
//!   binds every parameter, calls the method and writes its result;
//! - `api_document(title, version)`, which builds the OpenAPI description.
//!
//! Include it with `mod routegen_gen;` in the entry file.

mod format;
mod templates;
mod write;

use std::path::PathBuf;

use tracing::info;

pub use format::{format_source, GENERATED_HEADER};
pub use templates::RoutesTemplateData;
pub use write::write_atomic;

use crate::config::GenerateConfig;
use crate::error::GenerateError;
use crate::scanner::{scan, RouteTable, ScanConfig};

/// File name of the generated module
pub const GENERATED_FILE_NAME: &str = "routegen_gen.rs";

/// Result of a generation run
#[derive(Debug)]
pub struct GenerateOutcome {
    /// Where the module was (or, for a dry run, would be) written
    pub output: PathBuf,
    /// Formatted module source
    pub source: String,
    pub table: RouteTable,
    /// `false` for dry runs
    pub written: bool,
}

/// Scan the configured handler tree
///
/// # Errors
///
/// Any scan failure, see [`scan`].
pub fn build_table(config: &GenerateConfig) -> Result<RouteTable, GenerateError> {
    let grammar = config.grammar.grammar(&config.marker);
    scan(&ScanConfig {
        src_dir: &config.src_dir,
        handler_dir: &config.handler_dir,
        crate_prefix: &config.crate_prefix,
        grammar: grammar.as_ref(),
    })
}

/// Render the formatted module for `table`. Identical tables give identical output.
///
/// # Errors
///
/// [`GenerateError::Template`] or [`GenerateError::Format`].
pub fn render_routes(table: &RouteTable, package: &str) -> Result<String, GenerateError> {
    let raw = RoutesTemplateData::from_table(table, package).render_source()?;
    format_source(&raw)
}

/// Run the whole pipeline. With `dry_run` nothing is written.
///
/// # Errors
///
/// The first failing stage's error; no output is written in that case.
pub fn generate(config: &GenerateConfig, dry_run: bool) -> Result<GenerateOutcome, GenerateError> {
    let table = build_table(config)?;
    let source = render_routes(&table, &config.package_name)?;
    let output = config.output_path();
    if !dry_run {
        write_atomic(&output, &source)?;
        info!(
            path = %output.display(),
            controllers = table.controllers().count(),
            routes = table.route_count(),
            "generated route module"
        );
    }
    Ok(GenerateOutcome {
        output,
        source,
        table,
        written: !dry_run,
    })
}
