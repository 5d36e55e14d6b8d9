//! Core protocol abstractions for the negotiation layer.
//!
//! This module holds the per-request data model the pipeline operates on:
//!
//! - **Request** ([`request`]): immutable view of the incoming request with
//!   memoized derived state (query map, base URI, conditional timestamps,
//!   unquoted entity-tag lists)
//! - **Response** ([`response`]): mutable per-request response state with
//!   canonical-formatting header setters
//! - **MediaType** ([`media_type`]): media-type value with wildcard matching
//! - **Body** ([`body`]): closed tagged variant over the four body-producer
//!   shapes, with lazy per-chunk transforms
//! - **Errors** ([`error`]): contract-violation error types
//!
//! Instances of [`Request`] and [`Response`] are exclusively owned by the
//! single worker processing a request; nothing here is shared across
//! requests.

mod error;
pub use error::EncodeError;
pub use error::MediaTypeError;
pub use error::RequestError;

mod media_type;
pub use media_type::MediaType;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

pub mod body;
pub use body::Body;
pub use body::Transform;
