//! Per-request content negotiation and response encoding for HTTP resources
//!
//! This crate implements the negotiation and response-encoding core of a
//! resource-oriented HTTP toolkit. Given a parsed request and a resource's
//! declared capabilities (acceptable media types, charsets, encodings,
//! languages, conditional-request metadata), it decides how the response body
//! must be transformed and framed, and produces correctly-quoted
//! conditional/caching headers.
//!
//! # Features
//!
//! - Incoming `Content-Type` matching with `*/*` and `type/*` wildcard rules
//! - `Vary` composition with deterministic header ordering
//! - Quoted entity tags, HTTP-date formatted `Expires`/`Last-Modified`
//! - Four body-producer shapes (fixed buffer, finite sequence, lazy stream,
//!   deferred callable) encoded uniformly while preserving laziness
//! - `Content-Length` vs `Transfer-Encoding: chunked` framing decided from
//!   the final body shape
//! - Tolerant conditional-header parsing (malformed input degrades to absent)
//!
//! # Example
//!
//! ```
//! use micro_conneg::negotiation::Negotiator;
//! use micro_conneg::protocol::{Request, Response};
//! use micro_conneg::resource::Resource;
//!
//! struct Greeting;
//!
//! impl Resource for Greeting {
//!     fn generate_etag(&self) -> Option<String> {
//!         Some("v1".to_string())
//!     }
//! }
//!
//! let request = Request::from(
//!     http::Request::builder()
//!         .method("GET")
//!         .uri("http://example.org/greeting?lang=en")
//!         .body(None)
//!         .unwrap(),
//! );
//!
//! let mut response = Response::new();
//! response.set_body("hello world");
//!
//! let mut resource = Greeting;
//! let mut negotiator = Negotiator::new(&request, &mut response, &mut resource);
//!
//! negotiator.add_caching_headers();
//! negotiator.encode_body_if_set().unwrap();
//!
//! assert_eq!(response.header("etag"), Some("\"v1\""));
//! assert_eq!(response.content_length(), Some(11));
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: request/response models, media types, body shapes
//! - [`resource`]: the capability-provider trait the decision graph consumes
//! - [`negotiation`]: the per-request negotiation and encoding pipeline
//! - [`headers`]: quoting utilities for quoted header tokens
//!
//! # Scope
//!
//! The request-lifecycle decision graph, transport I/O, and routing live
//! outside this crate; they drive the pipeline through the [`negotiation`]
//! entry points using the request/response models as shared per-request
//! context. Each request is processed end-to-end by a single worker, so the
//! models need no internal locking.

pub mod headers;
pub mod negotiation;
pub mod protocol;
pub mod resource;

pub use negotiation::Negotiator;
pub use protocol::{Body, MediaType, Request, Response, Transform};
pub use resource::Resource;
