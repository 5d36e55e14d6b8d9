//! Mutable per-request response state.
//!
//! A `Response` is created once per request with defaults, mutated by the
//! decision graph and the negotiation pipeline, handed to the transport at
//! the end and then discarded. It is exclusively owned by the single worker
//! processing the request.
//!
//! The header setters apply canonical HTTP formatting: entity tags are
//! quoted, `Expires`/`Last-Modified` use the standard HTTP date format.

use std::time::SystemTime;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, header};
use tracing::warn;

use crate::headers::ensure_quoted;
use crate::protocol::body::Body;

/// Per-request response state.
#[derive(Debug)]
pub struct Response {
    code: StatusCode,
    headers: HeaderMap,
    body: Body,
    is_redirect: bool,
    trace: Vec<String>,
    end_state: Option<String>,
    error: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            code: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::Empty,
            is_redirect: false,
            trace: Vec::new(),
            end_state: None,
            error: None,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.code
    }

    pub fn set_status(&mut self, code: StatusCode) {
        self.code = code;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Case-insensitive header lookup; values that are not valid UTF-8 read
    /// as absent.
    pub fn header<K: header::AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The parsed `Content-Length` header, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH).and_then(|value| value.parse().ok())
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Replaces the body with [`Body::Empty`] and returns the previous value.
    pub fn take_body(&mut self) -> Body {
        self.body.take()
    }

    pub fn is_redirect(&self) -> bool {
        self.is_redirect
    }

    /// Appends a visited decision-graph state identifier to the trace.
    pub fn push_trace(&mut self, state: impl Into<String>) {
        self.trace.push(state.into());
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub fn end_state(&self) -> Option<&str> {
        self.end_state.as_deref()
    }

    /// Marks the terminal state, set only on error or early exit.
    pub fn set_end_state(&mut self, state: impl Into<String>) {
        self.end_state = Some(state.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Sets the `ETag` header to the quoted form of `etag`; `None` leaves
    /// the header untouched.
    pub fn set_etag(&mut self, etag: Option<&str>) {
        if let Some(etag) = etag {
            self.insert_header(header::ETAG, ensure_quoted(etag).as_ref());
        }
    }

    /// Sets the `Expires` header as an HTTP date; `None` is a no-op.
    pub fn set_expires(&mut self, when: Option<SystemTime>) {
        if let Some(when) = when {
            self.insert_header(header::EXPIRES, &httpdate::fmt_http_date(when));
        }
    }

    /// Sets the `Last-Modified` header as an HTTP date; `None` is a no-op.
    pub fn set_last_modified(&mut self, when: Option<SystemTime>) {
        if let Some(when) = when {
            self.insert_header(header::LAST_MODIFIED, &httpdate::fmt_http_date(when));
        }
    }

    /// Marks the response as a redirect, setting `Location` when given.
    pub fn do_redirect(&mut self, location: Option<&Uri>) {
        if let Some(location) = location {
            self.insert_header(header::LOCATION, &location.to_string());
        }
        self.is_redirect = true;
    }

    fn insert_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => warn!(header = %name, value, "dropping header value that fails validation"),
        }
    }
}
