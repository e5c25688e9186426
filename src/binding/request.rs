//! Per-request state shared by all binders of one handler call.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Uri};
use tracing::debug;

use super::ValidationError;
use crate::openapi::FORM_MEDIA_TYPE;

/// Method, URI, headers and matched path parameters of a request
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Path parameters captured by the dispatch table, in pattern order
    pub path_params: Vec<(String, String)>,
}

impl RequestHead {
    /// Value of the path parameter `name`
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
enum Body {
    Unread(Vec<u8>),
    Consumed,
}

/// The request a handler's binders extract from.
///
/// The body can be read once. Form values are parsed on first use and cached,
/// so any number of form binders share one parse.
#[derive(Debug)]
pub struct BindRequest {
    head: RequestHead,
    body: Body,
    form: Option<Vec<(String, String)>>,
}

impl BindRequest {
    #[must_use]
    pub fn new(request: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            head: RequestHead {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                path_params: Vec::new(),
            },
            body: Body::Unread(body),
            form: None,
        }
    }

    #[must_use]
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub(crate) fn set_path_params(&mut self, params: Vec<(String, String)>) {
        self.head.path_params = params;
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.head.path_param(name)
    }

    /// First query-string value for `name`
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        let query = self.head.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Take the body for a document binder.
    ///
    /// # Errors
    ///
    /// [`ValidationError::BodyConsumed`] when another binder already read it.
    pub fn take_body(&mut self, key: &str) -> Result<Vec<u8>, ValidationError> {
        match std::mem::replace(&mut self.body, Body::Consumed) {
            Body::Unread(bytes) => Ok(bytes),
            Body::Consumed => Err(ValidationError::BodyConsumed {
                key: key.to_string(),
            }),
        }
    }

    /// First form value for `name`: urlencoded body fields come before query fields.
    ///
    /// The body is only read when the request declares an urlencoded content type.
    ///
    /// # Errors
    ///
    /// [`ValidationError::BodyConsumed`] if a form body must be parsed but was
    /// already taken by another binder.
    pub fn form_value(&mut self, name: &str) -> Result<Option<String>, ValidationError> {
        if self.form.is_none() {
            let mut values = Vec::new();
            if self.has_form_body() {
                let body = self.take_body(name)?;
                values.extend(
                    url::form_urlencoded::parse(&body).map(|(k, v)| (k.into_owned(), v.into_owned())),
                );
            }
            if let Some(query) = self.head.uri.query() {
                values.extend(
                    url::form_urlencoded::parse(query.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned())),
                );
            }
            debug!(fields = values.len(), "parsed form values");
            self.form = Some(values);
        }
        Ok(self
            .form
            .iter()
            .flatten()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    fn has_form_body(&self) -> bool {
        self.head
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_MEDIA_TYPE))
    }
}
