//! # Response writing
//!
//! [`ResponseWriter`] is the per-request sink handlers and responders write to.
//! It either buffers the body (the default for [`crate::DispatchTable::handle`])
//! or streams it to any [`Write`] implementation. Status and headers are
//! recorded and can be read back; in streaming mode only the body bytes go to
//! the sink.
//!
//! A handler's return value implements [`Responder`]:
//!
//! - [`JsonResponse<T>`] sets the status and `Content-Type: application/json`
//!   and writes `T` as JSON. It documents response `"200"` with `T`'s schema.
//! - [`StreamResponse`] sets the status and copies a reader verbatim. It
//!   documents nothing.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::openapi::{ApiSchema, OperationDoc, JSON_MEDIA_TYPE};

enum Sink {
    Buffer(Vec<u8>),
    Stream(Box<dyn Write + Send>),
}

struct WriterState {
    status: StatusCode,
    headers: HeaderMap,
    body_started: bool,
    sink: Sink,
}

/// Cloneable handle on one request's response
#[derive(Clone)]
pub struct ResponseWriter {
    inner: Arc<Mutex<WriterState>>,
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ResponseWriter")
            .field("status", &state.status)
            .field("headers", &state.headers)
            .field("body_started", &state.body_started)
            .finish_non_exhaustive()
    }
}

impl ResponseWriter {
    fn with_sink(sink: Sink) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WriterState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body_started: false,
                sink,
            })),
        }
    }

    /// Writer that keeps the body in memory
    #[must_use]
    pub fn buffered() -> Self {
        Self::with_sink(Sink::Buffer(Vec::new()))
    }

    /// Writer that forwards body bytes to `sink`
    #[must_use]
    pub fn streaming(sink: impl Write + Send + 'static) -> Self {
        Self::with_sink(Sink::Stream(Box::new(sink)))
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status. Ignored once body bytes have been written.
    pub fn write_status(&self, status: StatusCode) {
        let mut state = self.lock();
        if !state.body_started {
            state.status = status;
        }
    }

    /// Set a header. Ignored once body bytes have been written.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        let mut state = self.lock();
        if !state.body_started {
            state.headers.insert(name, value);
        }
    }

    /// Append body bytes
    ///
    /// # Errors
    ///
    /// Whatever the streaming sink reports.
    pub fn write_body(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        state.body_started = true;
        match &mut state.sink {
            Sink::Buffer(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            Sink::Stream(w) => w.write_all(bytes),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    /// Copy of the buffered body; empty for streaming writers
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        match &self.lock().sink {
            Sink::Buffer(buf) => buf.clone(),
            Sink::Stream(_) => Vec::new(),
        }
    }

    /// Build an [`http::Response`] from the recorded status, headers and buffered body
    #[must_use]
    pub fn into_http_response(self) -> http::Response<Vec<u8>> {
        let mut state = self.lock();
        let body = match &mut state.sink {
            Sink::Buffer(buf) => std::mem::take(buf),
            Sink::Stream(_) => Vec::new(),
        };
        let mut response = http::Response::new(body);
        *response.status_mut() = state.status;
        *response.headers_mut() = std::mem::take(&mut state.headers);
        response
    }
}

impl Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.lock().sink {
            Sink::Buffer(_) => Ok(()),
            Sink::Stream(w) => w.flush(),
        }
    }
}

/// A handler return value that knows how to write and describe itself
pub trait Responder {
    /// Write the response
    ///
    /// # Errors
    ///
    /// Serialization or transport failures.
    fn write(self, writer: &ResponseWriter) -> io::Result<()>;

    /// Register the response on the operation
    fn describe(op: &mut OperationDoc)
    where
        Self: Sized;
}

/// JSON body with a status code
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse<T> {
    pub code: StatusCode,
    pub data: T,
}

impl<T> JsonResponse<T> {
    /// `200 OK` with `data`
    pub fn ok(data: T) -> Self {
        Self {
            code: StatusCode::OK,
            data,
        }
    }

    pub fn with_status(code: StatusCode, data: T) -> Self {
        Self { code, data }
    }
}

impl<T: Serialize + ApiSchema> Responder for JsonResponse<T> {
    fn write(self, writer: &ResponseWriter) -> io::Result<()> {
        let bytes = serde_json::to_vec(&self.data).map_err(io::Error::other)?;
        writer.write_status(self.code);
        writer.insert_header(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
        writer.write_body(&bytes)
    }

    fn describe(op: &mut OperationDoc) {
        op.set_response("200", JSON_MEDIA_TYPE, Some(T::json_schema()));
        op.add_components(T::referenced_schemas());
    }
}

/// Status code plus a reader copied to the body verbatim
pub struct StreamResponse {
    pub code: StatusCode,
    pub data: Box<dyn Read + Send>,
}

impl StreamResponse {
    pub fn new(code: StatusCode, data: impl Read + Send + 'static) -> Self {
        Self {
            code,
            data: Box::new(data),
        }
    }
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

impl Responder for StreamResponse {
    fn write(mut self, writer: &ResponseWriter) -> io::Result<()> {
        writer.write_status(self.code);
        let mut sink = writer.clone();
        io::copy(&mut self.data, &mut sink)?;
        Ok(())
    }

    fn describe(_op: &mut OperationDoc) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_response_writes_status_type_and_body() {
        let writer = ResponseWriter::buffered();
        JsonResponse::with_status(StatusCode::CREATED, vec![1u32, 2])
            .write(&writer)
            .unwrap();
        let response = writer.into_http_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body(), b"[1,2]");
    }

    #[test]
    fn test_stream_response_copies_verbatim() {
        let writer = ResponseWriter::buffered();
        StreamResponse::new(StatusCode::OK, &b"raw bytes"[..])
            .write(&writer)
            .unwrap();
        assert_eq!(writer.body(), b"raw bytes");
        assert!(writer.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_failing_transport_surfaces_io_error() {
        let writer = ResponseWriter::streaming(FailingWriter);
        let err = JsonResponse::ok("hello".to_string())
            .write(&writer)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let writer = ResponseWriter::streaming(FailingWriter);
        let err = StreamResponse::new(StatusCode::OK, &b"x"[..])
            .write(&writer)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_status_is_fixed_once_body_starts() {
        let writer = ResponseWriter::buffered();
        writer.write_status(StatusCode::ACCEPTED);
        writer.write_body(b"x").unwrap();
        writer.write_status(StatusCode::NOT_FOUND);
        assert_eq!(writer.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_describe() {
        let mut op = OperationDoc::default();
        <JsonResponse<Vec<String>> as Responder>::describe(&mut op);
        assert_eq!(op.responses["200"].content[JSON_MEDIA_TYPE].schema["type"], "array");
        let mut op = OperationDoc::default();
        <StreamResponse as Responder>::describe(&mut op);
        assert!(op.responses.is_empty());
    }
}
