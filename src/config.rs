//! # Generation Configuration
//!
//! A generation run needs four things: the crate root, the entry file the
//! generated module sits next to, the handler directory to scan and the
//! annotation grammar. Each can come from three places, highest priority first:
//!
//! 1. command-line flags (or their `ROUTEGEN_*` environment fallbacks, see [`crate::cli`])
//! 2. `[package.metadata.routegen]` in the root `Cargo.toml`
//! 3. built-in defaults
//!
//! ```toml
//! [package.metadata.routegen]
//! entry = "src/lib.rs"
//! handler = "src/handlers"
//! grammar = "directive"
//! marker = "//routegen:api"
//! ```
//!
//! Relative paths are resolved against the crate root. The handler directory
//! must sit under `<root>/src` so every scanned file has a module path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::GenerateError;
use crate::generator::GENERATED_FILE_NAME;
use crate::scanner::{GrammarKind, DEFAULT_DIRECTIVE_MARKER};

/// Name of the manifest looked up at the crate root
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Handler directory used when neither flags nor manifest name one
pub const DEFAULT_HANDLER_DIR: &str = "src/handlers";

/// `[package.metadata.routegen]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutegenMetadata {
    pub entry: Option<PathBuf>,
    pub handler: Option<PathBuf>,
    pub grammar: Option<GrammarKind>,
    pub marker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    package: Option<PackageSection>,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: Option<String>,
    metadata: Option<MetadataSection>,
}

#[derive(Debug, Deserialize)]
struct MetadataSection {
    routegen: Option<RoutegenMetadata>,
}

/// The parts of `Cargo.toml` a run cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub package_name: String,
    pub metadata: RoutegenMetadata,
}

impl Manifest {
    /// Read `<root>/Cargo.toml`.
    ///
    /// # Errors
    ///
    /// [`GenerateError::Configuration`] when the manifest is missing, is not
    /// valid TOML or has no `[package].name`.
    pub fn load(root: &Path) -> Result<Self, GenerateError> {
        let path = root.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|err| {
            GenerateError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::parse(&text).map_err(|msg| {
            GenerateError::Configuration(format!("{}: {msg}", path.display()))
        })
    }

    fn parse(text: &str) -> Result<Self, String> {
        let file: ManifestFile = toml::from_str(text).map_err(|e| e.to_string())?;
        let package = file
            .package
            .ok_or_else(|| "missing [package] table".to_string())?;
        let package_name = package
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "missing package name".to_string())?;
        let metadata = package
            .metadata
            .and_then(|m| m.routegen)
            .unwrap_or_default();
        Ok(Self {
            package_name,
            metadata,
        })
    }
}

/// Values supplied on the command line; `None` defers to the manifest
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub entry: Option<PathBuf>,
    pub handler: Option<PathBuf>,
    pub grammar: Option<GrammarKind>,
    pub marker: Option<String>,
}

/// Fully resolved, validated settings for one run
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Canonical crate root
    pub root: PathBuf,
    /// `<root>/src`
    pub src_dir: PathBuf,
    /// Canonical entry file
    pub entry: PathBuf,
    /// Canonical handler directory
    pub handler_dir: PathBuf,
    pub package_name: String,
    /// `crate` or the package name with `-` mapped to `_`
    pub crate_prefix: String,
    pub grammar: GrammarKind,
    pub marker: String,
}

impl GenerateConfig {
    /// Merge overrides, manifest and defaults, then validate every path.
    ///
    /// # Errors
    ///
    /// [`GenerateError::Configuration`] for a missing root, manifest, entry or
    /// handler directory, or a handler directory outside `<root>/src`.
    pub fn resolve(root: &Path, overrides: Overrides) -> Result<Self, GenerateError> {
        let root = canonical(root, "crate root")?;
        let manifest = Manifest::load(&root)?;
        let meta = manifest.metadata;

        let src_dir = canonical(&root.join("src"), "source directory")?;
        let handler = overrides
            .handler
            .or(meta.handler)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HANDLER_DIR));
        let handler_dir = canonical(&root.join(handler), "handler directory")?;
        if !handler_dir.is_dir() {
            return Err(GenerateError::Configuration(format!(
                "handler path {} is not a directory",
                handler_dir.display()
            )));
        }
        if !handler_dir.starts_with(&src_dir) {
            return Err(GenerateError::Configuration(format!(
                "handler directory {} is not under {}",
                handler_dir.display(),
                src_dir.display()
            )));
        }

        let entry = match overrides.entry.or(meta.entry) {
            Some(entry) => canonical(&root.join(entry), "entry file")?,
            None => default_entry(&src_dir)?,
        };
        if !entry.is_file() || !entry.starts_with(&root) {
            return Err(GenerateError::Configuration(format!(
                "entry {} must be a file under {}",
                entry.display(),
                root.display()
            )));
        }

        let crate_prefix = crate_prefix(&manifest.package_name, &src_dir, &entry, &handler_dir)?;

        Ok(Self {
            root,
            src_dir,
            entry,
            handler_dir,
            package_name: manifest.package_name,
            crate_prefix,
            grammar: overrides.grammar.or(meta.grammar).unwrap_or_default(),
            marker: overrides
                .marker
                .or(meta.marker)
                .unwrap_or_else(|| DEFAULT_DIRECTIVE_MARKER.to_string()),
        })
    }

    /// Where the generated module is written
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.entry
            .parent()
            .unwrap_or(&self.src_dir)
            .join(GENERATED_FILE_NAME)
    }
}

fn canonical(path: &Path, what: &str) -> Result<PathBuf, GenerateError> {
    fs::canonicalize(path).map_err(|err| {
        GenerateError::Configuration(format!("{what} {} not found: {err}", path.display()))
    })
}

fn default_entry(src_dir: &Path) -> Result<PathBuf, GenerateError> {
    ["lib.rs", "main.rs"]
        .iter()
        .map(|name| src_dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            GenerateError::Configuration(format!(
                "no entry given and neither lib.rs nor main.rs exists in {}",
                src_dir.display()
            ))
        })
}

/// How the generated module names the crate that owns the handlers.
///
/// The handlers are reachable through `crate` when the entry is the crate root
/// library, when the handler tree is `src` itself, or when the entry declares
/// the handler tree's top module. Otherwise the generated module lives in a
/// different crate target (usually a binary) and uses the library by name.
fn crate_prefix(
    package_name: &str,
    src_dir: &Path,
    entry: &Path,
    handler_dir: &Path,
) -> Result<String, GenerateError> {
    let library_name = package_name.replace('-', "_");
    if entry == src_dir.join("lib.rs") {
        return Ok("crate".to_string());
    }
    let top_module = handler_dir
        .strip_prefix(src_dir)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    let Some(top_module) = top_module else {
        return Ok("crate".to_string());
    };

    let source = fs::read_to_string(entry).map_err(|err| GenerateError::io(entry, err))?;
    let file = syn::parse_file(&source).map_err(|err| GenerateError::Parse {
        path: entry.to_path_buf(),
        message: err.to_string(),
    })?;
    let declares = file
        .items
        .iter()
        .any(|item| matches!(item, syn::Item::Mod(m) if m.ident == top_module));
    Ok(if declares {
        "crate".to_string()
    } else {
        library_name
    })
}
