//! Errors raised while scanning sources and generating route glue.
//!
//! Every variant here is fatal for a generation run. Unresolvable type
//! expressions are deliberately absent: they are logged and rendered as the
//! `unknown` sentinel so the generated file fails to compile instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal generation error
#[derive(Debug)]
pub enum GenerateError {
    /// Missing manifest, unreadable package name, or paths that do not sit under the root
    Configuration(String),
    /// A directive comment that does not have exactly three tokens
    MalformedDirective {
        /// File containing the directive
        file: PathBuf,
        /// 1-based line of the directive
        line: usize,
        /// The offending comment text
        text: String,
    },
    /// A source file `syn` could not parse
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message with position
        message: String,
    },
    /// Template rendering failed
    Template(String),
    /// The rendered source did not survive the format pass
    Format(String),
    /// Filesystem failure while walking, reading or writing
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short name of the pipeline stage that failed, used in diagnostics
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            GenerateError::Configuration(_) => "configuration",
            GenerateError::MalformedDirective { .. } | GenerateError::Parse { .. } => "scan",
            GenerateError::Template(_) => "template",
            GenerateError::Format(_) => "format",
            GenerateError::Io { .. } => "io",
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            GenerateError::MalformedDirective { file, line, text } => write!(
                f,
                "malformed route directive at {}:{line}: `{text}` \
                 (expected exactly three tokens: marker, METHOD, PATH)",
                file.display()
            ),
            GenerateError::Parse { path, message } => {
                write!(f, "failed to parse {}: {message}", path.display())
            }
            GenerateError::Template(msg) => write!(f, "error executing template: {msg}"),
            GenerateError::Format(msg) => write!(f, "error formatting source: {msg}"),
            GenerateError::Io { path, source } => {
                write!(f, "i/o error on {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_directive_message_names_location() {
        let err = GenerateError::MalformedDirective {
            file: PathBuf::from("src/handlers/users.rs"),
            line: 12,
            text: "//routegen:api GET".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/handlers/users.rs:12"));
        assert!(msg.contains("//routegen:api GET"));
        assert_eq!(err.stage(), "scan");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(GenerateError::Template("x".into()).stage(), "template");
        assert_eq!(GenerateError::Format("x".into()).stage(), "format");
        assert_eq!(
            GenerateError::Configuration("x".into()).stage(),
            "configuration"
        );
    }
}
