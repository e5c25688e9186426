//! # Dispatch table
//!
//! The table generated registration code writes into. Each route pairs a set
//! of methods with a path pattern and a handler closure. Patterns use `:name`
//! or `{name}` segments; they are compiled to anchored regular expressions and
//! matched in registration order.
//!
//! Path parameters are percent-decoded before binding; a capture that does not
//! decode to UTF-8 is answered with 400. [`DispatchTable::scope`] mounts the
//! routes registered inside it under a path prefix, and scopes nest.
//!
//! [`DispatchTable::handle`] is the buffered entry point for an HTTP server:
//! it never fails, turning every [`DispatchError`] into a status code and a
//! JSON error body.

use std::borrow::Cow;
use std::fmt;
use std::io;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use crate::binding::{BindRequest, ValidationError};
use crate::response::ResponseWriter;

/// Request handler produced by generated code
pub type Handler =
    dyn Fn(&mut BindRequest, &ResponseWriter) -> Result<(), DispatchError> + Send + Sync;

/// Hook run before every handler; an error short-circuits the request
pub type Middleware =
    dyn Fn(&mut BindRequest, &ResponseWriter) -> Result<(), DispatchError> + Send + Sync;

/// Why a request was not served
#[derive(Debug)]
pub enum DispatchError {
    /// No pattern matches the path
    NotFound { path: String },
    /// A pattern matches but not for this method
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    /// A binder rejected the request
    Validation(ValidationError),
    /// Writing the response failed
    Io(io::Error),
    /// A `&mut self` controller's lock was poisoned by an earlier panic
    ControllerPoisoned,
    /// A route could not be registered
    InvalidRoute { pattern: String, reason: String },
    /// Raised by middleware with its own status
    Rejected { status: StatusCode, message: String },
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DispatchError::Io(_)
            | DispatchError::ControllerPoisoned
            | DispatchError::InvalidRoute { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Rejected { status, .. } => *status,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { path } => write!(f, "no route for {path}"),
            DispatchError::MethodNotAllowed { method, allowed } => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                write!(f, "method {method} not allowed, expected one of {}", allowed.join(", "))
            }
            DispatchError::Validation(err) => write!(f, "{err}"),
            DispatchError::Io(err) => write!(f, "failed to write response: {err}"),
            DispatchError::ControllerPoisoned => write!(f, "controller lock poisoned"),
            DispatchError::InvalidRoute { pattern, reason } => {
                write!(f, "invalid route `{pattern}`: {reason}")
            }
            DispatchError::Rejected { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Validation(err) => Some(err),
            DispatchError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        DispatchError::Validation(err)
    }
}

impl From<io::Error> for DispatchError {
    fn from(err: io::Error) -> Self {
        DispatchError::Io(err)
    }
}

struct Route {
    methods: Vec<Method>,
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
    handler: Box<Handler>,
}

/// Method and path pattern of a registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub methods: Vec<Method>,
    pub pattern: String,
}

/// Routes in registration order plus middleware
#[derive(Default)]
pub struct DispatchTable {
    routes: Vec<Route>,
    middleware: Vec<Box<Middleware>>,
    prefix: String,
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("routes", &self.routes())
            .field("middleware", &self.middleware.len())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `methods` on `pattern`. An empty method list accepts any method.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRoute`] for an unknown method or a pattern that
    /// does not compile.
    pub fn register<F>(&mut self, methods: &[&str], pattern: &str, handler: F) -> Result<(), DispatchError>
    where
        F: Fn(&mut BindRequest, &ResponseWriter) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        let methods = methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|e| {
                    DispatchError::InvalidRoute {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pattern = if self.prefix.is_empty() {
            pattern.to_string()
        } else {
            join_path(&[&self.prefix, pattern])
        };
        let (regex, param_names) = path_to_regex(&pattern)?;
        debug!(pattern = %pattern, methods = ?methods, "route registered");
        self.routes.push(Route {
            methods,
            pattern,
            regex,
            param_names,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Run `f` with every route it registers mounted under `prefix`.
    ///
    /// Nested scopes join their prefixes, so a controller group can sit under
    /// its parent's path:
    ///
    /// ```
    /// use routegen::DispatchTable;
    ///
    /// let mut table = DispatchTable::new();
    /// table.scope("/api", |api| {
    ///     api.scope("v1", |v1| v1.register(&["GET"], "/users/:id", |_, _| Ok(())))
    /// })?;
    /// assert_eq!(table.routes()[0].pattern, "/api/v1/users/:id");
    /// # Ok::<(), routegen::DispatchError>(())
    /// ```
    pub fn scope<F, R>(&mut self, prefix: &str, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let outer = std::mem::take(&mut self.prefix);
        self.prefix = join_path(&[&outer, prefix]);
        let result = f(self);
        self.prefix = outer;
        result
    }

    pub fn add_middleware<F>(&mut self, middleware: F)
    where
        F: Fn(&mut BindRequest, &ResponseWriter) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.middleware.push(Box::new(middleware));
    }

    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|r| RouteInfo {
                methods: r.methods.clone(),
                pattern: r.pattern.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route `req` to its handler.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] or [`DispatchError::MethodNotAllowed`] when
    /// no route accepts the request, otherwise whatever middleware or the
    /// handler return.
    pub fn dispatch(&self, req: &mut BindRequest, resp: &ResponseWriter) -> Result<(), DispatchError> {
        let path = req.uri().path().to_string();
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(caps) = route.regex.captures(&path) else {
                continue;
            };
            if !route.methods.is_empty() && !route.methods.contains(req.method()) {
                allowed.extend(route.methods.iter().cloned());
                continue;
            }
            let params = route
                .param_names
                .iter()
                .zip(caps.iter().skip(1))
                .map(|(name, m)| decode_param(name, m.map_or("", |m| m.as_str())))
                .collect::<Result<Vec<_>, _>>()?;
            req.set_path_params(params);
            for middleware in &self.middleware {
                middleware(req, resp)?;
            }
            return (route.handler)(req, resp);
        }
        if allowed.is_empty() {
            Err(DispatchError::NotFound { path })
        } else {
            Err(DispatchError::MethodNotAllowed {
                method: req.method().clone(),
                allowed,
            })
        }
    }

    /// Serve a buffered request. Errors become `{"error", "message"}` JSON bodies.
    #[must_use]
    pub fn handle(&self, request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let mut req = BindRequest::new(request);
        let writer = ResponseWriter::buffered();
        match self.dispatch(&mut req, &writer) {
            Ok(()) => {
                debug!(method = %req.method(), path = %req.uri().path(), status = %writer.status(), "request served");
                writer.into_http_response()
            }
            Err(err) => {
                warn!(method = %req.method(), path = %req.uri().path(), status = %err.status(), error = %err, "request failed");
                error_response(&err)
            }
        }
    }
}

/// Status plus JSON error body for `err`
#[must_use]
pub fn error_response(err: &DispatchError) -> http::Response<Vec<u8>> {
    let status = err.status();
    let body = json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": err.to_string(),
    });
    let mut response = http::Response::new(body.to_string().into_bytes());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let DispatchError::MethodNotAllowed { allowed, .. } = err {
        let list: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        if let Ok(value) = HeaderValue::from_str(&list.join(", ")) {
            response.headers_mut().insert(http::header::ALLOW, value);
        }
    }
    response
}

/// Join URL path pieces into one absolute, cleaned path.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment,
/// so `join_path(&["/api/", "v1", "../v2", "/users/:id"])` is `/api/v2/users/:id`.
/// Nothing joins to `/`.
#[must_use]
pub fn join_path(parts: &[&str]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in parts.iter().flat_map(|part| part.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

fn decode_param(name: &str, raw: &str) -> Result<(String, String), ValidationError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|value| (name.to_string(), Cow::into_owned(value)))
        .map_err(|e| ValidationError::invalid(name, "path", format!("not UTF-8 once decoded: {e}")))
}

/// Compile a route pattern to an anchored regex and its parameter names
fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), DispatchError> {
    let mut pattern = String::with_capacity(path.len() + 5);
    pattern.push('^');
    let mut param_names = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let name = segment
            .strip_prefix(':')
            .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')));
        match name {
            Some(name) if !name.is_empty() => {
                pattern.push_str("/([^/]+)");
                param_names.push(name.to_string());
            }
            _ => {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
    }
    if param_names.is_empty() && pattern.len() == 1 {
        pattern.push('/');
    }
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|e| DispatchError::InvalidRoute {
        pattern: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok((regex, param_names))
}
