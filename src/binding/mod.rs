//! # Parameter binding
//!
//! A handler parameter's type decides where its value comes from. Each binder
//! type implements [`Binder`]. At request time it extracts itself from a
//! [`BindRequest`]. At documentation time it describes the parameter on an
//! [`OperationDoc`]. Generated code calls both halves with the parameter's name
//! as the key:
//!
//! ```ignore
//! let id: Path<i64> = routegen::bind("id", req, resp)?;
//! <Path<i64> as routegen::Binder>::describe("id", &mut op);
//! ```
//!
//! | binder          | source                                   | documented as               |
//! |-----------------|------------------------------------------|-----------------------------|
//! | [`Path<T>`]     | matched path segment                     | `path` parameter (required) |
//! | [`Query<T>`]    | first query-string value                 | `query` parameter           |
//! | [`Header<T>`]   | request header, `_` read as `-`          | `header` parameter          |
//! | [`Form<T>`]     | urlencoded body field, then query field  | shared form object schema   |
//! | [`Json<T>`]     | JSON request body                        | `application/json` body     |
//! | [`RawRequest`]  | method, URI, headers, path parameters    | nothing                     |
//! | [`RawResponse`] | handle on the response writer            | nothing                     |
//!
//! Scalar binders accept the closed set in [`ScalarValue`]. A missing value
//! binds as empty text, so numeric binders reject it.

mod request;
mod scalar;

use std::fmt;

use serde::de::DeserializeOwned;

pub use request::{BindRequest, RequestHead};
pub use scalar::{ScalarKind, ScalarValue};

use crate::openapi::{ApiSchema, OperationDoc, ParameterLocation, JSON_MEDIA_TYPE};
use crate::response::ResponseWriter;

/// A request value that could not be bound; always answered with 400
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A scalar parameter could not be converted
    Invalid {
        key: String,
        location: &'static str,
        reason: String,
    },
    /// A body binder ran after the body was already read
    BodyConsumed { key: String },
    /// The body could not be decoded
    Body { key: String, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(key: &str, location: &'static str, reason: String) -> Self {
        ValidationError::Invalid {
            key: key.to_string(),
            location,
            reason,
        }
    }

    /// Name of the parameter that failed
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            ValidationError::Invalid { key, .. }
            | ValidationError::BodyConsumed { key }
            | ValidationError::Body { key, .. } => key,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Invalid {
                key,
                location,
                reason,
            } => write!(f, "invalid {location} parameter `{key}`: {reason}"),
            ValidationError::BodyConsumed { key } => {
                write!(f, "request body for `{key}` was already read")
            }
            ValidationError::Body { key, reason } => {
                write!(f, "invalid request body for `{key}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A handler parameter that binds itself from the request
pub trait Binder: Sized {
    /// Extract the value for parameter `key`.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] when the value is missing where required or fails to convert.
    fn extract(
        key: &str,
        req: &mut BindRequest,
        resp: &ResponseWriter,
    ) -> Result<Self, ValidationError>;

    /// Describe parameter `key` on the operation
    fn describe(key: &str, op: &mut OperationDoc);
}

/// Extract binder `B` for `key`; the call generated code makes for each parameter
///
/// # Errors
///
/// Propagates the binder's [`ValidationError`].
pub fn bind<B: Binder>(
    key: &str,
    req: &mut BindRequest,
    resp: &ResponseWriter,
) -> Result<B, ValidationError> {
    B::extract(key, req, resp)
}

/// Matched path segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path<T> {
    pub value: T,
}

impl<T: ScalarValue> Binder for Path<T> {
    fn extract(key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        let text = req.path_param(key).unwrap_or("");
        T::from_text(text)
            .map(|value| Path { value })
            .map_err(|reason| ValidationError::invalid(key, "path", reason))
    }

    fn describe(key: &str, op: &mut OperationDoc) {
        op.add_parameter(key, ParameterLocation::Path, T::KIND.schema());
    }
}

/// First query-string value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query<T> {
    pub value: T,
}

impl<T: ScalarValue> Binder for Query<T> {
    fn extract(key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        let text = req.query_value(key).unwrap_or_default();
        T::from_text(&text)
            .map(|value| Query { value })
            .map_err(|reason| ValidationError::invalid(key, "query", reason))
    }

    fn describe(key: &str, op: &mut OperationDoc) {
        op.add_parameter(key, ParameterLocation::Query, T::KIND.schema());
    }
}

/// Request header, looked up case-insensitively.
///
/// Parameter names cannot contain `-`, so `_` in the key is read as `-`: a
/// parameter `x_request_id: Header<String>` binds `X-Request-Id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header<T> {
    pub value: T,
}

impl<T: ScalarValue> Binder for Header<T> {
    fn extract(key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        let name = header_name(key);
        let text = match req.headers().get(name.as_str()) {
            Some(v) => v
                .to_str()
                .map_err(|e| ValidationError::invalid(key, "header", e.to_string()))?,
            None => "",
        };
        T::from_text(text)
            .map(|value| Header { value })
            .map_err(|reason| ValidationError::invalid(key, "header", reason))
    }

    fn describe(key: &str, op: &mut OperationDoc) {
        op.add_parameter(&header_name(key), ParameterLocation::Header, T::KIND.schema());
    }
}

fn header_name(key: &str) -> String {
    key.replace('_', "-")
}

/// Urlencoded form field; body fields take precedence over query fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form<T> {
    pub value: T,
}

impl<T: ScalarValue> Binder for Form<T> {
    fn extract(key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        let text = req.form_value(key)?.unwrap_or_default();
        T::from_text(&text)
            .map(|value| Form { value })
            .map_err(|reason| ValidationError::invalid(key, "form", reason))
    }

    fn describe(key: &str, op: &mut OperationDoc) {
        op.add_form_field(key, T::KIND.schema());
    }
}

/// JSON request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T> {
    pub value: T,
}

impl<T: DeserializeOwned + ApiSchema> Binder for Json<T> {
    fn extract(key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        let body = req.take_body(key)?;
        serde_json::from_slice(&body)
            .map(|value| Json { value })
            .map_err(|e| ValidationError::Body {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn describe(_key: &str, op: &mut OperationDoc) {
        op.set_body(JSON_MEDIA_TYPE, T::json_schema());
        op.add_components(T::referenced_schemas());
    }
}

/// The request head, for handlers that need raw access
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub value: RequestHead,
}

impl Binder for RawRequest {
    fn extract(_key: &str, req: &mut BindRequest, _: &ResponseWriter) -> Result<Self, ValidationError> {
        Ok(RawRequest {
            value: req.head().clone(),
        })
    }

    fn describe(_key: &str, _op: &mut OperationDoc) {}
}

/// A second handle on the response writer
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub value: ResponseWriter,
}

impl Binder for RawResponse {
    fn extract(_key: &str, _req: &mut BindRequest, resp: &ResponseWriter) -> Result<Self, ValidationError> {
        Ok(RawResponse {
            value: resp.clone(),
        })
    }

    fn describe(_key: &str, _op: &mut OperationDoc) {}
}
