//! The route table produced by a scan.
//!
//! Controllers are keyed by the canonical text of their receiver type, so
//! `&UserController` and `UserController` are separate entries. Every map is a
//! `BTreeMap` so iteration, and therefore the generated file, is stable.

use std::collections::BTreeMap;

use serde::Serialize;

use super::annotation::HandlerDoc;

/// One handler parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    /// Binding key, the identifier the parameter pattern binds
    pub key: String,
    /// Declaration-context type (`&Form<String>`)
    #[serde(rename = "type")]
    pub ty: String,
    /// Value-context type (`Form<String>`), the type the binder extracts
    pub value_type: String,
}

impl ParameterSpec {
    /// How the extracted value is passed to the handler: `""`, `"&"` or `"&mut "`
    #[must_use]
    pub fn borrow_prefix(&self) -> &'static str {
        if self.ty.starts_with("&mut ") {
            "&mut "
        } else if self.ty.starts_with('&') {
            "&"
        } else {
            ""
        }
    }
}

/// A handler method bound to one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerSpec {
    pub path: String,
    pub methods: Vec<String>,
    pub function_name: String,
    pub parameters: Vec<ParameterSpec>,
    pub result_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<HandlerDoc>,
}

impl HandlerSpec {
    /// The first declared method, if any
    #[must_use]
    pub fn http_method(&self) -> Option<&str> {
        self.methods.first().map(String::as_str)
    }
}

/// How the handler receiver takes the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverKind {
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
    /// `self`, the controller must be `Clone`
    Owned,
    /// `self: Arc<Self>`
    SharedArc,
}

/// Everything generated for one controller type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerEntry {
    /// Canonical receiver key, e.g. `&UserController`
    pub receiver_type_name: String,
    /// Path of the controller type usable from the generated module
    pub type_path: String,
    /// Module path of the file that first declared a handler on this receiver
    pub source_alias: String,
    pub receiver_kind: ReceiverKind,
    /// Handlers grouped by route path, in declaration order within a path
    pub routes: BTreeMap<String, Vec<HandlerSpec>>,
}

impl ControllerEntry {
    /// Name of the generated registration function
    #[must_use]
    pub fn register_fn(&self) -> String {
        let base = self
            .type_path
            .split('<')
            .next()
            .and_then(|p| p.rsplit("::").next())
            .unwrap_or(&self.type_path);
        let suffix = match self.receiver_kind {
            ReceiverKind::Shared => "",
            ReceiverKind::Exclusive => "_mut",
            ReceiverKind::Owned => "_owned",
            ReceiverKind::SharedArc => "_arc",
        };
        format!("register_{}{suffix}", snake_case(base))
    }

    /// Iterate handlers in path order, then declaration order
    pub fn handlers(&self) -> impl Iterator<Item = &HandlerSpec> {
        self.routes.values().flatten()
    }
}

/// Receiver-level data fixed by the first handler seen on a controller
#[derive(Debug, Clone)]
pub struct ControllerSource {
    pub type_path: String,
    pub source_alias: String,
    pub receiver_kind: ReceiverKind,
}

/// Controllers keyed by receiver, plus the module paths the generated file references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    controllers: BTreeMap<String, ControllerEntry>,
    imports: Vec<String>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `spec` under `receiver`, creating the controller on first sight.
    ///
    /// Returns `true` when a new controller entry was created.
    pub fn insert(&mut self, receiver: &str, source: &ControllerSource, spec: HandlerSpec) -> bool {
        let mut created = false;
        let entry = self
            .controllers
            .entry(receiver.to_string())
            .or_insert_with(|| {
                created = true;
                ControllerEntry {
                    receiver_type_name: receiver.to_string(),
                    type_path: source.type_path.clone(),
                    source_alias: source.source_alias.clone(),
                    receiver_kind: source.receiver_kind,
                    routes: BTreeMap::new(),
                }
            });
        entry.routes.entry(spec.path.clone()).or_default().push(spec);
        created
    }

    /// Record a module path once
    pub fn record_import(&mut self, module: &str) {
        if !self.imports.iter().any(|m| m == module) {
            self.imports.push(module.to_string());
        }
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ControllerEntry> {
        self.controllers.values()
    }

    #[must_use]
    pub fn controller(&self, receiver: &str) -> Option<&ControllerEntry> {
        self.controllers.get(receiver)
    }

    #[must_use]
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Total number of handlers across all controllers
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.controllers.values().map(|c| c.handlers().count()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// `UserController` -> `user_controller`
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_lower = true;
        } else {
            out.push('_');
            prev_lower = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(path: &str, method: &str, name: &str) -> HandlerSpec {
        HandlerSpec {
            path: path.to_string(),
            methods: vec![method.to_string()],
            function_name: name.to_string(),
            parameters: Vec::new(),
            result_type: Some("JsonResponse<String>".to_string()),
            doc: None,
        }
    }

    fn source(kind: ReceiverKind) -> ControllerSource {
        ControllerSource {
            type_path: "app::handlers::UserController".to_string(),
            source_alias: "app::handlers".to_string(),
            receiver_kind: kind,
        }
    }

    #[test]
    fn test_two_handlers_on_one_path_are_both_kept() {
        let mut table = RouteTable::new();
        assert!(table.insert("&UserController", &source(ReceiverKind::Shared), spec("/users", "GET", "list")));
        assert!(!table.insert("&UserController", &source(ReceiverKind::Shared), spec("/users", "POST", "create")));
        let entry = table.controller("&UserController").unwrap();
        let handlers = &entry.routes["/users"];
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].http_method(), Some("GET"));
        assert_eq!(handlers[1].http_method(), Some("POST"));
        assert_eq!(table.route_count(), 2);
    }

    #[test]
    fn test_reference_forms_are_distinct_controllers() {
        let mut table = RouteTable::new();
        table.insert("&UserController", &source(ReceiverKind::Shared), spec("/a", "GET", "a"));
        table.insert("UserController", &source(ReceiverKind::Owned), spec("/b", "GET", "b"));
        assert_eq!(table.controllers().count(), 2);
        let names: Vec<String> = table.controllers().map(ControllerEntry::register_fn).collect();
        assert_eq!(names, vec!["register_user_controller", "register_user_controller_owned"]);
    }

    #[test]
    fn test_imports_are_deduplicated_in_order() {
        let mut table = RouteTable::new();
        table.record_import("crate::b");
        table.record_import("crate::a");
        table.record_import("crate::b");
        assert_eq!(table.imports(), ["crate::b", "crate::a"]);
    }

    #[test]
    fn test_borrow_prefix() {
        let p = |ty: &str| ParameterSpec {
            key: "x".into(),
            ty: ty.into(),
            value_type: ty.trim_start_matches("&mut ").trim_start_matches('&').into(),
        };
        assert_eq!(p("&mut Form<String>").borrow_prefix(), "&mut ");
        assert_eq!(p("&Path<i64>").borrow_prefix(), "&");
        assert_eq!(p("Path<i64>").borrow_prefix(), "");
        assert_eq!(http_method_none().http_method(), None);
    }

    fn http_method_none() -> HandlerSpec {
        HandlerSpec {
            methods: Vec::new(),
            ..spec("/x", "GET", "x")
        }
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("UserController"), "user_controller");
        assert_eq!(snake_case("Api2Handler"), "api2_handler");
        assert_eq!(snake_case("pets"), "pets");
    }
}
