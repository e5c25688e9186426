//! Source scanning: comments, annotation grammars, type resolution and the route table.
//!
//! [`scan`] walks a handler directory and returns a [`RouteTable`] that the
//! generator renders into registration glue.

pub mod annotation;
pub mod collect;
pub mod comments;
pub mod resolve;
pub mod table;

pub use annotation::{
    AnnotationGrammar, AnnotationRecord, GrammarKind, HandlerDoc, DEFAULT_DIRECTIVE_MARKER,
};
pub use collect::{scan, scan_source, ScanConfig};
pub use resolve::{TypeContext, TypeResolver, UNKNOWN_TYPE};
pub use table::{ControllerEntry, HandlerSpec, ParameterSpec, ReceiverKind, RouteTable};
