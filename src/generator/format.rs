//! Canonical formatting of generated source.
//!
//! The rendered template is parsed with `syn` and printed with `prettyplease`,
//! so output never depends on template whitespace and a template that renders
//! invalid Rust is caught before anything is written.

use crate::error::GenerateError;

/// First line of every generated file
pub const GENERATED_HEADER: &str = "// @generated by routegen. DO NOT EDIT.\n";

/// Parse and pretty-print `source`, then prepend [`GENERATED_HEADER`].
///
/// # Errors
///
/// [`GenerateError::Format`] with the parser position when `source` is not valid Rust.
pub fn format_source(source: &str) -> Result<String, GenerateError> {
    let file = syn::parse_file(source).map_err(|err| {
        let at = err.span().start();
        GenerateError::Format(format!("{}:{}: {err}", at.line, at.column + 1))
    })?;
    let mut out = String::with_capacity(source.len() + GENERATED_HEADER.len());
    out.push_str(GENERATED_HEADER);
    out.push_str(&prettyplease::unparse(&file));
    Ok(out)
}
