//! # OpenAPI description synthesis
//!
//! Generated `api_document` functions build an [`ApiDocument`] by letting every
//! binder and responder type describe itself into an [`OperationDoc`]. Schemas
//! come from [`utoipa::ToSchema`] and are stored as JSON values; named schemas
//! they reference are collected under `components`. The finished document
//! is checked by deserializing it into [`oas3::OpenApiV3Spec`], the same model
//! used to load specs elsewhere.
//!
//! Route paths use `:name` segments; the document rewrites them to `{name}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::dispatch::join_path;

/// Media type for urlencoded form bodies
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
/// Media type for JSON bodies
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Types that can describe themselves as a JSON Schema.
///
/// Implemented for every [`utoipa::ToSchema`] type, so user types get a schema
/// with `#[derive(utoipa::ToSchema)]`. Primitives, `String`, `Vec`, `Option`
/// and maps are covered by utoipa itself.
///
/// ```
/// use routegen::openapi::ApiSchema;
///
/// #[derive(utoipa::ToSchema)]
/// struct Pet {
///     name: String,
///     age: Option<u32>,
/// }
///
/// assert_eq!(Pet::json_schema()["required"][0], "name");
/// ```
pub trait ApiSchema {
    /// Inline schema of the type
    fn json_schema() -> Value;

    /// Named schemas the inline schema points at through `$ref`
    fn referenced_schemas() -> Vec<(String, Value)> {
        Vec::new()
    }
}

impl<T: utoipa::ToSchema + ?Sized> ApiSchema for T {
    fn json_schema() -> Value {
        serde_json::to_value(<T as utoipa::PartialSchema>::schema()).unwrap_or_default()
    }

    fn referenced_schemas() -> Vec<(String, Value)> {
        let mut schemas = Vec::new();
        T::schemas(&mut schemas);
        schemas
            .into_iter()
            .map(|(name, schema)| (name, serde_json::to_value(schema).unwrap_or_default()))
            .collect()
    }
}

/// Where a non-body parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
        }
    }
}

/// OpenAPI parameter object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDoc {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Value,
}

/// OpenAPI media type object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDoc {
    pub schema: Value,
}

/// OpenAPI request body object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestBodyDoc {
    pub content: BTreeMap<String, MediaDoc>,
}

/// OpenAPI response object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDoc {
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaDoc>,
}

/// One operation, filled in by binders and responders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDoc {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operation_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyDoc>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, ResponseDoc>,
    /// Named schemas referenced from this operation, hoisted into `components.schemas`
    #[serde(skip)]
    pub components: BTreeMap<String, Value>,
}

impl OperationDoc {
    #[must_use]
    pub fn new(operation_id: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            ..Self::default()
        }
    }

    /// Attach summary, description and tags from the handler annotation
    #[must_use]
    pub fn with_doc(mut self, summary: &str, description: &str, tags: &[&str]) -> Self {
        self.summary = summary.to_string();
        self.description = description.to_string();
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Add a path, query or header parameter. Path parameters are always required.
    pub fn add_parameter(&mut self, name: &str, location: ParameterLocation, schema: Value) {
        self.parameters.push(ParameterDoc {
            name: name.to_string(),
            location,
            required: location == ParameterLocation::Path,
            schema,
        });
    }

    /// Set the request body schema for one media type
    pub fn set_body(&mut self, media_type: &str, schema: Value) {
        self.request_body
            .get_or_insert_with(RequestBodyDoc::default)
            .content
            .insert(media_type.to_string(), MediaDoc { schema });
    }

    /// Add one field to the shared urlencoded form schema of this operation
    pub fn add_form_field(&mut self, name: &str, schema: Value) {
        let media = self
            .request_body
            .get_or_insert_with(RequestBodyDoc::default)
            .content
            .entry(FORM_MEDIA_TYPE.to_string())
            .or_insert_with(|| MediaDoc {
                schema: json!({"type": "object", "properties": {}}),
            });
        if let Some(props) = media
            .schema
            .get_mut("properties")
            .and_then(Value::as_object_mut)
        {
            props.insert(name.to_string(), schema);
        }
    }

    /// Record named schemas the operation's inline schemas refer to
    pub fn add_components(&mut self, schemas: Vec<(String, Value)>) {
        self.components.extend(schemas);
    }

    /// Register a response for `code`. `schema` of `None` documents a response without content.
    pub fn set_response(&mut self, code: &str, media_type: &str, schema: Option<Value>) {
        let mut content = BTreeMap::new();
        if let Some(schema) = schema {
            content.insert(media_type.to_string(), MediaDoc { schema });
        }
        self.responses.insert(
            code.to_string(),
            ResponseDoc {
                description: status_description(code).to_string(),
                content,
            },
        );
    }
}

fn status_description(code: &str) -> &'static str {
    match code {
        "200" => "OK",
        "201" => "Created",
        "204" => "No Content",
        "400" => "Bad Request",
        "404" => "Not Found",
        "500" => "Internal Server Error",
        _ => "Response",
    }
}

/// Rewrite `:name` path segments to OpenAPI `{name}` templates
#[must_use]
pub fn openapi_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// An OpenAPI 3.1 document built from the route table
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDocument {
    pub title: String,
    pub version: String,
    paths: BTreeMap<String, BTreeMap<String, OperationDoc>>,
    components: BTreeMap<String, Value>,
}

impl ApiDocument {
    #[must_use]
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            paths: BTreeMap::new(),
            components: BTreeMap::new(),
        }
    }

    /// Add `operation` under `path` for each method.
    ///
    /// A handler registered for any method is documented as `get`. With more
    /// than one method the operation id gets a `_<method>` suffix per copy so
    /// ids stay unique.
    pub fn add_operation(&mut self, path: &str, methods: &[&str], mut operation: OperationDoc) {
        self.components.append(&mut operation.components);
        let item = self.paths.entry(openapi_path(path)).or_default();
        if methods.is_empty() {
            item.insert("get".to_string(), operation);
            return;
        }
        for method in methods {
            let method = method.to_ascii_lowercase();
            let mut op = operation.clone();
            if methods.len() > 1 && !op.operation_id.is_empty() {
                op.operation_id = format!("{}_{method}", op.operation_id);
            }
            item.insert(method, op);
        }
    }

    /// Same document with every path mounted under `prefix`, matching
    /// [`crate::DispatchTable::scope`]
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        let paths = self
            .paths
            .into_iter()
            .map(|(path, item)| (join_path(&[prefix, &path]), item))
            .collect();
        Self { paths, ..self }
    }

    /// Operation registered for `path` (in either path syntax) and `method`
    #[must_use]
    pub fn operation(&self, path: &str, method: &str) -> Option<&OperationDoc> {
        self.paths
            .get(&openapi_path(path))
            .and_then(|item| item.get(&method.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }

    /// The document as a JSON value
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut doc = json!({
            "openapi": "3.1.0",
            "info": {"title": self.title, "version": self.version},
            "paths": self.paths,
        });
        if !self.components.is_empty() {
            doc["components"] = json!({"schemas": self.components});
        }
        doc
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_value())
    }

    /// YAML rendering
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_value())
    }

    /// Check the document against the OpenAPI 3.1 model
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the document is not valid OpenAPI.
    pub fn validate(&self) -> Result<oas3::OpenApiV3Spec, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}
