//! The per-request negotiation and encoding pipeline.
//!
//! The decision graph calls into this module at specific points of the
//! request lifecycle: accepting a written body ([`Negotiator::accept_helper`]),
//! computing variances ([`Negotiator::variances`]), adding caching headers
//! ([`Negotiator::add_caching_headers`]) and encoding the final body
//! ([`Negotiator::encode_body_if_set`]). The request/response models act as
//! shared per-request context; the resource is consulted through its
//! capability declarations only.

use http::{HeaderValue, StatusCode, header};
use tracing::{debug, trace};

use crate::protocol::body::{Transform, identity_transform};
use crate::protocol::EncodeError;
use crate::protocol::MediaType;
use crate::protocol::Request;
use crate::protocol::Response;
use crate::resource::Resource;

/// The negotiation pipeline for a single request.
///
/// Borrows the request, response and resource exclusively for the request's
/// lifetime; nothing here is shared across requests. The chosen charset and
/// encoding are decided upstream and handed in before encoding runs.
#[derive(Debug)]
pub struct Negotiator<'a, R: Resource> {
    request: &'a Request,
    response: &'a mut Response,
    resource: &'a mut R,
    chosen_charset: Option<String>,
    chosen_encoding: String,
}

impl<'a, R: Resource> Negotiator<'a, R> {
    pub fn new(request: &'a Request, response: &'a mut Response, resource: &'a mut R) -> Self {
        Self { request, response, resource, chosen_charset: None, chosen_encoding: "identity".to_string() }
    }

    /// Records the charset decided upstream; applied by [`Self::encode_body`].
    pub fn set_chosen_charset(&mut self, charset: Option<String>) {
        self.chosen_charset = charset;
    }

    /// Records the encoding decided upstream; applied by [`Self::encode_body`].
    pub fn set_chosen_encoding(&mut self, encoding: impl Into<String>) {
        self.chosen_encoding = encoding.into();
    }

    /// Dispatches the request entity to the first accept handler whose
    /// pattern matches the request's `Content-Type`.
    ///
    /// An absent `Content-Type` defaults to `application/octet-stream`.
    /// When no pattern matches, the outcome is 415 Unsupported Media Type —
    /// an ordinary control outcome handed back to the decision graph, not a
    /// fault.
    pub fn accept_helper(&mut self) -> Result<bool, StatusCode> {
        let content_type = match self.request.header(header::CONTENT_TYPE) {
            Some(raw) => match MediaType::parse(raw) {
                Ok(media_type) => media_type,
                Err(_) => {
                    debug!(content_type = raw, "unparsable content type on request");
                    return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
                }
            },
            None => MediaType::from(mime::APPLICATION_OCTET_STREAM),
        };

        let accepted = self.resource.content_types_accepted();
        match accepted.into_iter().find(|(pattern, _)| content_type.matches(pattern)) {
            Some((pattern, handler)) => {
                trace!(content_type = %content_type, pattern = %pattern, "dispatching request entity");
                Ok(handler(self.resource, self.request, self.response))
            }
            None => {
                debug!(content_type = %content_type, "no accept handler matches");
                Err(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            }
        }
    }

    /// Computes the `Vary` entries for this resource.
    ///
    /// The standard tokens appear first, each only when the corresponding
    /// provided set offers a real choice, in this exact order: `Accept`,
    /// `Accept-Charset`, `Accept-Encoding`, `Accept-Language`. The
    /// resource's custom entries follow.
    pub fn variances(&self) -> Vec<String> {
        let mut variances = Vec::new();

        if self.resource.content_types_provided().len() > 1 {
            variances.push("Accept".to_string());
        }
        if self.resource.charsets_provided().is_some_and(|charsets| charsets.len() > 1) {
            variances.push("Accept-Charset".to_string());
        }
        if self.resource.encodings_provided().len() > 1 {
            variances.push("Accept-Encoding".to_string());
        }
        if self.resource.languages_provided().len() > 1 {
            variances.push("Accept-Language".to_string());
        }

        variances.extend(self.resource.variances());
        variances
    }

    /// Feeds the resource's etag, expiry and last-modified values into the
    /// response. The three are independent; absence of one never blocks the
    /// others.
    pub fn add_caching_headers(&mut self) {
        self.response.set_etag(self.resource.generate_etag().as_deref());
        self.response.set_expires(self.resource.expires());
        self.response.set_last_modified(self.resource.last_modified());
    }

    /// Runs [`Self::encode_body`] unless the response body is known empty.
    pub fn encode_body_if_set(&mut self) -> Result<(), EncodeError> {
        if self.response.body().is_empty() {
            return Ok(());
        }
        self.encode_body()
    }

    /// Applies the chosen charset and encoding transforms to the response
    /// body and sets the framing headers.
    ///
    /// The body is wrapped per shape, preserving laziness; afterwards a
    /// fixed buffer gets `Content-Length` (any transfer coding left alone),
    /// everything else loses `Content-Length` and goes out
    /// `Transfer-Encoding: chunked`.
    pub fn encode_body(&mut self) -> Result<(), EncodeError> {
        let charsetter = self.charset_transform()?;
        let encoder = self.encoding_transform()?;

        let encoded = self.response.take_body().transformed(charsetter, encoder);

        if let Some(buf) = encoded.as_bytes() {
            let length = buf.len();
            self.response.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        } else {
            self.response.headers_mut().remove(header::CONTENT_LENGTH);
            self.response.headers_mut().insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        }

        self.response.set_body(encoded);
        Ok(())
    }

    /// Resolves the charset transform from the resource's declarations.
    ///
    /// An undeclared charset table, or no chosen charset, means no
    /// conversion. A chosen charset missing from a declared table is a
    /// contract violation.
    fn charset_transform(&self) -> Result<Transform, EncodeError> {
        let Some(charsets) = self.resource.charsets_provided() else {
            return Ok(identity_transform());
        };
        let Some(chosen) = self.chosen_charset.as_deref() else {
            return Ok(identity_transform());
        };

        charsets
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(chosen))
            .map(|(_, transform)| transform)
            .ok_or_else(|| EncodeError::unknown_charset(chosen))
    }

    /// Resolves the encoding transform; required, no default.
    fn encoding_transform(&self) -> Result<Transform, EncodeError> {
        self.resource
            .encodings_provided()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&self.chosen_encoding))
            .map(|(_, transform)| transform)
            .ok_or_else(|| EncodeError::unknown_encoding(&self.chosen_encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::body::{Body, BodyStream, DeferredBody};
    use crate::resource::AcceptHandler;
    use bytes::Bytes;
    use std::sync::Arc;

    fn get_request(uri: &str) -> Request {
        Request::new(http::Request::builder().method("GET").uri(uri).body(None).unwrap())
    }

    fn put_request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method("PUT").uri("/thing");
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        Request::new(builder.body(Some(Bytes::from_static(body.as_bytes()))).unwrap())
    }

    fn reverse_transform() -> Transform {
        Arc::new(|chunk: Bytes| {
            let mut reversed = chunk.to_vec();
            reversed.reverse();
            Bytes::from(reversed)
        })
    }

    fn upper_transform() -> Transform {
        Arc::new(|chunk: Bytes| Bytes::from(chunk.iter().map(u8::to_ascii_uppercase).collect::<Vec<u8>>()))
    }

    #[derive(Default)]
    struct Widget {
        json_accepted: usize,
        any_accepted: usize,
    }

    fn accept_json(widget: &mut Widget, _req: &Request, _resp: &mut Response) -> bool {
        widget.json_accepted += 1;
        true
    }

    fn accept_any(widget: &mut Widget, _req: &Request, _resp: &mut Response) -> bool {
        widget.any_accepted += 1;
        true
    }

    impl Resource for Widget {
        fn content_types_accepted(&self) -> Vec<(MediaType, AcceptHandler<Self>)> {
            vec![
                (MediaType::parse("application/json").unwrap(), accept_json),
                (MediaType::parse("*/*").unwrap(), accept_any),
            ]
        }
    }

    struct Nothing;

    impl Resource for Nothing {}

    #[test]
    fn accept_helper_picks_first_matching_pattern() {
        let request = put_request(Some("application/json"), "{}");
        let mut response = Response::new();
        let mut widget = Widget::default();

        let result = Negotiator::new(&request, &mut response, &mut widget).accept_helper();
        assert_eq!(result, Ok(true));
        assert_eq!(widget.json_accepted, 1);
        assert_eq!(widget.any_accepted, 0);
    }

    #[test]
    fn accept_helper_falls_through_to_wildcard() {
        let request = put_request(Some("text/plain"), "hi");
        let mut response = Response::new();
        let mut widget = Widget::default();

        let result = Negotiator::new(&request, &mut response, &mut widget).accept_helper();
        assert_eq!(result, Ok(true));
        assert_eq!(widget.json_accepted, 0);
        assert_eq!(widget.any_accepted, 1);
    }

    #[test]
    fn accept_helper_defaults_to_octet_stream() {
        let request = put_request(None, "raw");
        let mut response = Response::new();
        let mut widget = Widget::default();

        let result = Negotiator::new(&request, &mut response, &mut widget).accept_helper();
        assert_eq!(result, Ok(true));
        assert_eq!(widget.any_accepted, 1);
    }

    #[test]
    fn accept_helper_reports_unsupported_media_type() {
        let request = put_request(Some("application/json"), "{}");
        let mut response = Response::new();
        let mut nothing = Nothing;

        let result = Negotiator::new(&request, &mut response, &mut nothing).accept_helper();
        assert_eq!(result, Err(StatusCode::UNSUPPORTED_MEDIA_TYPE));
    }

    struct Multi {
        charsets: bool,
    }

    impl Resource for Multi {
        fn content_types_provided(&self) -> Vec<MediaType> {
            vec![MediaType::parse("text/html").unwrap(), MediaType::parse("application/json").unwrap()]
        }

        fn charsets_provided(&self) -> Option<Vec<(String, Transform)>> {
            self.charsets.then(|| {
                vec![("utf-8".to_string(), identity_transform()), ("us-ascii".to_string(), identity_transform())]
            })
        }

        fn encodings_provided(&self) -> Vec<(String, Transform)> {
            vec![
                ("identity".to_string(), identity_transform()),
                ("reverse".to_string(), reverse_transform()),
            ]
        }

        fn languages_provided(&self) -> Vec<String> {
            vec!["en".to_string(), "de".to_string()]
        }

        fn variances(&self) -> Vec<String> {
            vec!["Cookie".to_string()]
        }
    }

    #[test]
    fn variances_full_ordering() {
        let request = get_request("/thing");
        let mut response = Response::new();
        let mut multi = Multi { charsets: true };

        let variances = Negotiator::new(&request, &mut response, &mut multi).variances();
        assert_eq!(variances, ["Accept", "Accept-Charset", "Accept-Encoding", "Accept-Language", "Cookie"]);
    }

    #[test]
    fn variances_skip_undeclared_charsets() {
        let request = get_request("/thing");
        let mut response = Response::new();
        let mut multi = Multi { charsets: false };

        let variances = Negotiator::new(&request, &mut response, &mut multi).variances();
        assert_eq!(variances, ["Accept", "Accept-Encoding", "Accept-Language", "Cookie"]);
    }

    #[test]
    fn variances_only_accept() {
        struct TwoTypes;

        impl Resource for TwoTypes {
            fn content_types_provided(&self) -> Vec<MediaType> {
                vec![MediaType::parse("text/html").unwrap(), MediaType::parse("text/plain").unwrap()]
            }
        }

        let request = get_request("/thing");
        let mut response = Response::new();
        let mut resource = TwoTypes;

        let variances = Negotiator::new(&request, &mut response, &mut resource).variances();
        assert_eq!(variances, ["Accept"]);
    }

    struct Cached;

    impl Resource for Cached {
        fn generate_etag(&self) -> Option<String> {
            Some("v2".to_string())
        }

        fn last_modified(&self) -> Option<std::time::SystemTime> {
            Some(std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(784_111_777))
        }
    }

    #[test]
    fn caching_headers_are_independent() {
        let request = get_request("/thing");
        let mut response = Response::new();
        let mut cached = Cached;

        Negotiator::new(&request, &mut response, &mut cached).add_caching_headers();

        assert_eq!(response.header("etag"), Some("\"v2\""));
        assert_eq!(response.header("last-modified"), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        // expires stayed absent without blocking the others
        assert_eq!(response.header("expires"), None);
    }

    #[test]
    fn fixed_body_gets_content_length() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body("hello world");
        let mut nothing = Nothing;

        Negotiator::new(&request, &mut response, &mut nothing).encode_body_if_set().unwrap();

        assert_eq!(response.content_length(), Some(11));
        assert_eq!(response.header("transfer-encoding"), None);
        assert_eq!(response.body().as_bytes().unwrap(), &Bytes::from("hello world"));
    }

    #[test]
    fn empty_body_is_left_alone() {
        let request = get_request("/thing");
        let mut response = Response::new();
        let mut nothing = Nothing;

        Negotiator::new(&request, &mut response, &mut nothing).encode_body_if_set().unwrap();

        assert_eq!(response.content_length(), None);
        assert_eq!(response.header("transfer-encoding"), None);
        assert!(response.body().is_empty());
    }

    #[test]
    fn stream_body_switches_to_chunked() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        response.set_body(Body::Stream(BodyStream::new(vec![Bytes::from("a"), Bytes::from("b")].into_iter())));
        let mut multi = Multi { charsets: false };

        let mut negotiator = Negotiator::new(&request, &mut response, &mut multi);
        negotiator.set_chosen_encoding("reverse");
        negotiator.encode_body_if_set().unwrap();

        assert_eq!(response.content_length(), None);
        assert_eq!(response.header("transfer-encoding"), Some("chunked"));

        let chunks: Vec<Bytes> = response.take_body().into_chunks().collect();
        assert_eq!(chunks, vec![Bytes::from("a"), Bytes::from("b")]);
    }

    #[test]
    fn finite_sequence_transforms_lazily_in_order() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body(vec![Bytes::from("ab"), Bytes::from("cd")]);
        let mut multi = Multi { charsets: true };

        let mut negotiator = Negotiator::new(&request, &mut response, &mut multi);
        negotiator.set_chosen_charset(Some("utf-8".to_string()));
        negotiator.set_chosen_encoding("reverse");
        negotiator.encode_body_if_set().unwrap();

        assert_eq!(response.header("transfer-encoding"), Some("chunked"));
        let chunks: Vec<Bytes> = response.take_body().into_chunks().collect();
        assert_eq!(chunks, vec![Bytes::from("ba"), Bytes::from("dc")]);
    }

    #[test]
    fn deferred_body_frames_as_chunked_and_transforms_on_consumption() {
        struct Uppercasing;

        impl Resource for Uppercasing {
            fn encodings_provided(&self) -> Vec<(String, Transform)> {
                vec![("identity".to_string(), upper_transform())]
            }
        }

        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body(Body::Deferred(DeferredBody::new(|| Body::from("late"))));
        let mut resource = Uppercasing;
        Negotiator::new(&request, &mut response, &mut resource).encode_body_if_set().unwrap();

        assert_eq!(response.content_length(), None);
        assert_eq!(response.header("transfer-encoding"), Some("chunked"));

        let chunks: Vec<Bytes> = response.take_body().into_chunks().collect();
        assert_eq!(chunks, vec![Bytes::from("LATE")]);
    }

    #[test]
    fn unknown_encoding_is_a_contract_violation() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body("content");
        let mut nothing = Nothing;

        let mut negotiator = Negotiator::new(&request, &mut response, &mut nothing);
        negotiator.set_chosen_encoding("gzip");
        let result = negotiator.encode_body();
        assert!(matches!(result, Err(EncodeError::UnknownEncoding { .. })));
    }

    #[test]
    fn unknown_charset_is_a_contract_violation() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body("content");
        let mut multi = Multi { charsets: true };

        let mut negotiator = Negotiator::new(&request, &mut response, &mut multi);
        negotiator.set_chosen_charset(Some("koi8-r".to_string()));
        let result = negotiator.encode_body();
        assert!(matches!(result, Err(EncodeError::UnknownCharset { .. })));
    }

    #[test]
    fn undeclared_charsets_apply_no_conversion() {
        let request = get_request("/thing");
        let mut response = Response::new();
        response.set_body("stays");
        let mut nothing = Nothing;

        let mut negotiator = Negotiator::new(&request, &mut response, &mut nothing);
        negotiator.set_chosen_charset(Some("utf-16".to_string()));
        negotiator.encode_body().unwrap();

        assert_eq!(response.body().as_bytes().unwrap(), &Bytes::from("stays"));
    }
}
