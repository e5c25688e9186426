//! Askama template data for the generated route module.
//!
//! Every string placed into the template is precomputed here, already escaped
//! as a Rust literal where needed, so the template itself stays free of logic
//! beyond loops.

use askama::Template;

use crate::error::GenerateError;
use crate::scanner::{ControllerEntry, HandlerSpec, ReceiverKind, RouteTable};

/// One bound parameter of a route closure
#[derive(Debug, Clone)]
pub struct ParamView {
    /// Local variable holding the extracted binder
    pub local: String,
    /// Binding key as a string literal
    pub key_literal: String,
    /// Binder type to extract
    pub value_type: String,
    /// Expression passed to the handler (`p0`, `&p0`, `&mut p0`)
    pub arg: String,
}

/// One handler registration
#[derive(Debug, Clone)]
pub struct RouteView {
    pub function_name: String,
    /// `&["GET", "POST"]`
    pub methods_literal: String,
    pub path_literal: String,
    pub operation_id_literal: String,
    /// `.with_doc(..)` call chained onto the operation, or empty
    pub with_doc: String,
    pub params: Vec<ParamView>,
    /// Statement run before the call, e.g. taking a lock
    pub call_prelude: String,
    /// Expression the handler method is called on
    pub call_receiver: String,
    pub result_type: String,
}

/// One controller's registration function
#[derive(Debug, Clone)]
pub struct ControllerView {
    pub receiver_key: String,
    pub register_fn: String,
    pub handle_type: String,
    pub routes: Vec<RouteView>,
}

/// The generated module
#[derive(Template)]
#[template(path = "routes.rs.txt", escape = "none")]
pub struct RoutesTemplateData {
    /// Package the routes belong to, for the module docs
    pub package: String,
    /// Module path literals for `SOURCE_MODULES`
    pub modules: Vec<String>,
    pub controllers: Vec<ControllerView>,
}

impl RoutesTemplateData {
    #[must_use]
    pub fn from_table(table: &RouteTable, package: &str) -> Self {
        Self {
            package: package.to_string(),
            modules: table.imports().iter().map(|m| literal(m)).collect(),
            controllers: table.controllers().map(controller_view).collect(),
        }
    }

    /// Render the unformatted module source
    ///
    /// # Errors
    ///
    /// [`GenerateError::Template`] if askama fails.
    pub fn render_source(&self) -> Result<String, GenerateError> {
        self.render()
            .map_err(|e| GenerateError::Template(e.to_string()))
    }
}

fn controller_view(entry: &ControllerEntry) -> ControllerView {
    let handle_type = match entry.receiver_kind {
        ReceiverKind::Exclusive => format!(
            "::std::sync::Arc<::std::sync::Mutex<{}>>",
            entry.type_path
        ),
        _ => format!("::std::sync::Arc<{}>", entry.type_path),
    };
    ControllerView {
        receiver_key: entry.receiver_type_name.clone(),
        register_fn: entry.register_fn(),
        handle_type,
        routes: entry
            .handlers()
            .map(|h| route_view(h, entry.receiver_kind))
            .collect(),
    }
}

fn route_view(handler: &HandlerSpec, kind: ReceiverKind) -> RouteView {
    let (call_prelude, call_receiver) = match kind {
        ReceiverKind::Shared => (String::new(), "controller".to_string()),
        ReceiverKind::Exclusive => (
            "let mut guard = controller.lock().map_err(|_| ::routegen::DispatchError::ControllerPoisoned)?;"
                .to_string(),
            "guard".to_string(),
        ),
        ReceiverKind::Owned => (
            String::new(),
            "::std::clone::Clone::clone(&*controller)".to_string(),
        ),
        ReceiverKind::SharedArc => (
            String::new(),
            "::std::sync::Arc::clone(&controller)".to_string(),
        ),
    };

    let with_doc = handler.doc.as_ref().map_or_else(String::new, |doc| {
        format!(
            ".with_doc({}, {}, {})",
            literal(&doc.summary),
            literal(&doc.description),
            slice_literal(&doc.tags)
        )
    });

    RouteView {
        function_name: handler.function_name.clone(),
        methods_literal: slice_literal(&handler.methods),
        path_literal: literal(&handler.path),
        operation_id_literal: literal(&handler.function_name),
        with_doc,
        params: handler
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let local = format!("p{i}");
                ParamView {
                    arg: format!("{}{local}", p.borrow_prefix()),
                    local,
                    key_literal: literal(&p.key),
                    value_type: p.value_type.clone(),
                }
            })
            .collect(),
        call_prelude,
        call_receiver,
        result_type: handler.result_type.clone().unwrap_or_else(|| "()".to_string()),
    }
}

/// Rust string literal for `s`
fn literal(s: &str) -> String {
    format!("{s:?}")
}

/// `&["a", "b"]`
fn slice_literal(items: &[String]) -> String {
    let inner: Vec<String> = items.iter().map(|s| literal(s)).collect();
    format!("&[{}]", inner.join(", "))
}
