//! Route annotation grammars.
//!
//! Two comment grammars mark a method as a route handler:
//!
//! - **Tag comments**, a block of lines attached to the handler by name:
//!
//!   ```text
//!   /// get_user Fetches
//!   /// @Description one-user
//!   /// @Tags users,public
//!   /// @GET /users/:id
//!   ```
//!
//! - **Directives**, a single line placed directly above the method:
//!
//!   ```text
//!   //routegen:api GET /users/:id
//!   ```
//!
//! Both are strategies behind [`AnnotationGrammar`]; a run picks one through
//! [`GrammarKind`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::comments::CommentGroup;
use crate::error::GenerateError;

/// Default directive marker token
pub const DEFAULT_DIRECTIVE_MARKER: &str = "//routegen:api";

/// Documentation carried from a tag annotation into the generated API document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerDoc {
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A tag-comment annotation, keyed by the function name it documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagAnnotation {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub url: String,
    pub methods: Vec<String>,
}

/// A directive annotation, keyed by the line that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveAnnotation {
    pub method: String,
    pub path: String,
}

/// A recognised annotation, from either grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationRecord {
    Tag(TagAnnotation),
    Directive(DirectiveAnnotation),
}

impl AnnotationRecord {
    /// Route path the annotation declares
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            AnnotationRecord::Tag(tag) => &tag.url,
            AnnotationRecord::Directive(directive) => &directive.path,
        }
    }

    /// HTTP methods the annotation declares, possibly empty for tag blocks
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        match self {
            AnnotationRecord::Tag(tag) => tag.methods.clone(),
            AnnotationRecord::Directive(directive) => vec![directive.method.clone()],
        }
    }

    /// Documentation for the API description; directives carry none
    #[must_use]
    pub fn doc(&self) -> Option<HandlerDoc> {
        match self {
            AnnotationRecord::Tag(tag) => Some(HandlerDoc {
                summary: tag.summary.clone(),
                description: tag.description.clone(),
                tags: tag.tags.clone(),
            }),
            AnnotationRecord::Directive(_) => None,
        }
    }
}

/// Per-file lookup from declarations to their annotation
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    by_name: HashMap<String, AnnotationRecord>,
    by_line: HashMap<usize, AnnotationRecord>,
}

impl AnnotationIndex {
    /// Find the annotation for a function named `name` whose first token sits on `start_line`
    #[must_use]
    pub fn lookup(&self, name: &str, start_line: usize) -> Option<&AnnotationRecord> {
        self.by_name
            .get(name)
            .or_else(|| self.by_line.get(&start_line))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len() + self.by_line.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A comment grammar that turns a file's comment groups into an [`AnnotationIndex`]
pub trait AnnotationGrammar {
    /// Build the annotation index for one file.
    ///
    /// # Errors
    ///
    /// Grammars with fatal syntax (directives) return
    /// [`GenerateError::MalformedDirective`].
    fn index(&self, file: &Path, groups: &[CommentGroup]) -> Result<AnnotationIndex, GenerateError>;
}

/// Which grammar a generation run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GrammarKind {
    /// Tag comments, keywords matched case-insensitively
    #[default]
    Tag,
    /// Tag comments, keywords matched exactly (`@URL`, `@Method`, ...)
    TagStrict,
    /// Single-line `//routegen:api METHOD PATH` directives
    Directive,
}

impl GrammarKind {
    /// Build the grammar strategy; `marker` only matters for directives
    #[must_use]
    pub fn grammar(self, marker: &str) -> Box<dyn AnnotationGrammar> {
        match self {
            GrammarKind::Tag => Box::new(TagGrammar::new(false)),
            GrammarKind::TagStrict => Box::new(TagGrammar::new(true)),
            GrammarKind::Directive => Box::new(DirectiveGrammar::new(marker)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Description,
    Tags,
    Url,
    Method,
    Verb(&'static str),
}

const KEYWORDS: [(&str, Keyword); 8] = [
    ("@Description", Keyword::Description),
    ("@Tags", Keyword::Tags),
    ("@URL", Keyword::Url),
    ("@Method", Keyword::Method),
    ("@GET", Keyword::Verb("GET")),
    ("@POST", Keyword::Verb("POST")),
    ("@PUT", Keyword::Verb("PUT")),
    ("@DELETE", Keyword::Verb("DELETE")),
];

/// Tag-comment grammar
#[derive(Debug, Clone, Copy)]
pub struct TagGrammar {
    case_sensitive: bool,
}

impl TagGrammar {
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    fn keyword(&self, token: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(kw, _)| {
                if self.case_sensitive {
                    *kw == token
                } else {
                    kw.eq_ignore_ascii_case(token)
                }
            })
            .map(|(_, k)| *k)
    }

    /// Parse one comment block. Returns `None` unless the block declares a URL.
    #[must_use]
    pub fn parse_group(&self, group: &CommentGroup) -> Option<TagAnnotation> {
        let mut doc = TagAnnotation::default();
        for line in &group.lines {
            let words = line.words();
            if words.len() <= 2 {
                continue;
            }
            match self.keyword(words[1]) {
                Some(Keyword::Tags) => doc.tags = split_list(words[2]),
                Some(Keyword::Description) => doc.description = words[2].to_string(),
                Some(Keyword::Method) => doc.methods = split_list(&words[2].to_uppercase()),
                Some(Keyword::Url) => doc.url = words[2].to_string(),
                Some(Keyword::Verb(verb)) => {
                    doc.methods = vec![verb.to_string()];
                    doc.url = words[2].to_string();
                }
                None => {
                    if doc.name.is_empty() {
                        doc.name = words[1].to_string();
                        doc.summary = words[2].to_string();
                    }
                }
            }
        }
        (!doc.url.is_empty()).then_some(doc)
    }
}

impl AnnotationGrammar for TagGrammar {
    fn index(&self, _file: &Path, groups: &[CommentGroup]) -> Result<AnnotationIndex, GenerateError> {
        let mut index = AnnotationIndex::default();
        for group in groups {
            if let Some(tag) = self.parse_group(group) {
                index
                    .by_name
                    .insert(tag.name.clone(), AnnotationRecord::Tag(tag));
            }
        }
        Ok(index)
    }
}

/// Directive grammar: `<marker> METHOD PATH` on one line
#[derive(Debug, Clone)]
pub struct DirectiveGrammar {
    marker: String,
}

impl DirectiveGrammar {
    #[must_use]
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl AnnotationGrammar for DirectiveGrammar {
    fn index(&self, file: &Path, groups: &[CommentGroup]) -> Result<AnnotationIndex, GenerateError> {
        let mut index = AnnotationIndex::default();
        for line in groups.iter().flat_map(|g| g.lines.iter()) {
            let words = line.words();
            if words.first() != Some(&self.marker.as_str()) {
                continue;
            }
            if words.len() != 3 {
                return Err(GenerateError::MalformedDirective {
                    file: file.to_path_buf(),
                    line: line.line,
                    text: line.text.clone(),
                });
            }
            index.by_line.insert(
                line.line + 1,
                AnnotationRecord::Directive(DirectiveAnnotation {
                    method: words[1].to_string(),
                    path: words[2].to_string(),
                }),
            );
        }
        Ok(index)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
