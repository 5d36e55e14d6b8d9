//! Request model with memoized derived views.
//!
//! Wraps an already-parsed `http::Request` and layers the derived state the
//! decision graph keeps asking for: the query map, the base URI, conditional
//! timestamps and unquoted entity-tag lists. Each derived view is computed
//! once on first access and cached; the request itself is immutable.
//!
//! Malformed conditional headers degrade to "absent" rather than erroring:
//! HTTP clients routinely send broken conditional headers and the resource
//! must still be reachable.

use std::collections::HashMap;
use std::time::SystemTime;

use bytes::Bytes;
use http::header::AsHeaderName;
use http::uri::PathAndQuery;
use http::{HeaderName, Method, Uri, header};
use once_cell::sync::OnceCell;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::headers::unquote;
use crate::protocol::error::RequestError;

/// An incoming HTTP request plus memoized derived state.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Option<Bytes>>,
    query: OnceCell<HashMap<String, String>>,
    base_uri: OnceCell<Uri>,
    if_modified_since: OnceCell<Option<SystemTime>>,
    if_unmodified_since: OnceCell<Option<SystemTime>>,
    if_match: OnceCell<Vec<String>>,
    if_none_match: OnceCell<Vec<String>>,
}

impl From<http::Request<Option<Bytes>>> for Request {
    fn from(inner: http::Request<Option<Bytes>>) -> Self {
        Self::new(inner)
    }
}

impl Request {
    pub fn new(inner: http::Request<Option<Bytes>>) -> Self {
        Self {
            inner,
            query: OnceCell::new(),
            base_uri: OnceCell::new(),
            if_modified_since: OnceCell::new(),
            if_unmodified_since: OnceCell::new(),
            if_match: OnceCell::new(),
            if_none_match: OnceCell::new(),
        }
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &http::HeaderMap {
        self.inner.headers()
    }

    /// Returns the request body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.inner.body().as_ref()
    }

    /// Returns true iff the request carries a non-empty body.
    pub fn has_body(&self) -> bool {
        self.inner.body().as_ref().is_some_and(|body| !body.is_empty())
    }

    /// Case-insensitive header lookup; values that are not valid UTF-8 read
    /// as absent.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.inner.headers().get(name).and_then(|value| value.to_str().ok())
    }

    /// Looks up a header by an underscored derived-accessor token, e.g.
    /// `if_unmodified_since` for `If-Unmodified-Since`.
    ///
    /// Tokens are restricted to `[a-z0-9]+(_[a-z0-9]+)*`; anything else is
    /// rejected rather than dispatched dynamically.
    pub fn derived_header(&self, token: &str) -> Result<Option<&str>, RequestError> {
        if !is_derived_token(token) {
            return Err(RequestError::no_such_accessor(token));
        }
        let name = token.replace('_', "-");
        Ok(self.header(name.as_str()))
    }

    pub fn is_get(&self) -> bool {
        self.inner.method() == Method::GET
    }

    pub fn is_head(&self) -> bool {
        self.inner.method() == Method::HEAD
    }

    pub fn is_post(&self) -> bool {
        self.inner.method() == Method::POST
    }

    pub fn is_put(&self) -> bool {
        self.inner.method() == Method::PUT
    }

    pub fn is_delete(&self) -> bool {
        self.inner.method() == Method::DELETE
    }

    pub fn is_trace(&self) -> bool {
        self.inner.method() == Method::TRACE
    }

    pub fn is_connect(&self) -> bool {
        self.inner.method() == Method::CONNECT
    }

    pub fn is_options(&self) -> bool {
        self.inner.method() == Method::OPTIONS
    }

    /// The query string parsed into a map, last wins on duplicate keys.
    ///
    /// Each `key=value` token is percent-decoded as a whole and then split
    /// on `=` (decode-then-split; a percent-encoded `=` therefore splits).
    /// Tokens without both a key and a value are dropped.
    pub fn query(&self) -> &HashMap<String, String> {
        self.query.get_or_init(|| parse_query(self.inner.uri().query().unwrap_or("")))
    }

    /// The request URI with the path reset to `/` and the query cleared.
    pub fn base_uri(&self) -> &Uri {
        self.base_uri.get_or_init(|| {
            let mut parts = self.inner.uri().clone().into_parts();
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
            Uri::from_parts(parts).unwrap_or_else(|_| Uri::from_static("/"))
        })
    }

    /// The parsed `If-Modified-Since` timestamp; absent or malformed reads
    /// as `None`.
    pub fn if_modified_since(&self) -> Option<SystemTime> {
        *self.if_modified_since.get_or_init(|| self.parse_date_header(header::IF_MODIFIED_SINCE))
    }

    /// The parsed `If-Unmodified-Since` timestamp; absent or malformed reads
    /// as `None`.
    pub fn if_unmodified_since(&self) -> Option<SystemTime> {
        *self.if_unmodified_since.get_or_init(|| self.parse_date_header(header::IF_UNMODIFIED_SINCE))
    }

    /// The unquoted entity tags of `If-Match`, in header order; an absent or
    /// unreadable header yields an empty slice.
    pub fn if_match_values(&self) -> &[String] {
        self.if_match.get_or_init(|| self.parse_etag_header(header::IF_MATCH))
    }

    /// The unquoted entity tags of `If-None-Match`, in header order; an
    /// absent or unreadable header yields an empty slice.
    pub fn if_none_match_values(&self) -> &[String] {
        self.if_none_match.get_or_init(|| self.parse_etag_header(header::IF_NONE_MATCH))
    }

    fn parse_date_header(&self, name: HeaderName) -> Option<SystemTime> {
        let value = self.header(&name)?;
        match httpdate::parse_http_date(value) {
            Ok(time) => Some(time),
            Err(_) => {
                debug!(header = %name, value, "ignoring unparsable http date");
                None
            }
        }
    }

    fn parse_etag_header(&self, name: HeaderName) -> Vec<String> {
        match self.header(&name) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(|tag| unquote(tag).to_string())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Checks a derived-accessor token against `[a-z0-9]+(_[a-z0-9]+)*`.
fn is_derived_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .split('_')
            .all(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();

    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }

        let spaced = pair.replace('+', " ");
        let decoded = percent_decode_str(&spaced).decode_utf8_lossy();

        // mirror the historical split: trailing empty segments vanish, then
        // the first two segments must both exist
        let mut segments: Vec<&str> = decoded.split('=').collect();
        while segments.last() == Some(&"") {
            segments.pop();
        }
        if segments.len() < 2 {
            continue;
        }

        query.insert(segments[0].to_string(), segments[1].to_string());
    }

    query
}
