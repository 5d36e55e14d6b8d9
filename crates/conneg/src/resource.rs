//! The capability-provider seam between a resource and the pipeline.
//!
//! A resource declares what it can accept and produce; the negotiation
//! pipeline consults those declarations and never looks past them. All
//! lists and mappings are ordered: earlier entries win ties. Resources are
//! read-only for the duration of a request, except where an accept handler
//! mutates the resource it is bound to.

use std::time::SystemTime;

use crate::protocol::body::{Transform, identity_transform};
use crate::protocol::MediaType;
use crate::protocol::Request;
use crate::protocol::Response;

/// An incoming-body handler bound to a resource.
///
/// Invoked when the request's `Content-Type` matches the pattern the handler
/// was registered under. The returned flag is handed back to the decision
/// graph unchanged.
pub type AcceptHandler<R> = fn(&mut R, &Request, &mut Response) -> bool;

/// Declared capabilities of an HTTP resource.
///
/// Every method has a permissive default so a minimal resource implements
/// nothing at all. The defaults describe a resource that accepts no written
/// bodies, applies the identity encoding, declares no charsets or languages,
/// and emits no caching metadata.
pub trait Resource {
    /// Ordered media types this resource can produce, counted for `Vary`.
    fn content_types_provided(&self) -> Vec<MediaType> {
        Vec::new()
    }

    /// Ordered mapping of content-type pattern to incoming-body handler.
    ///
    /// The first entry whose pattern matches the request's `Content-Type`
    /// wins; patterns may use `type/*` and `*/*` wildcards.
    fn content_types_accepted(&self) -> Vec<(MediaType, AcceptHandler<Self>)>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Ordered mapping of charset name to chunk transform, or `None` when
    /// the resource declares no charsets at all (the pipeline then applies
    /// the identity transform).
    fn charsets_provided(&self) -> Option<Vec<(String, Transform)>> {
        None
    }

    /// Ordered mapping of encoding name to chunk transform.
    ///
    /// Unlike charsets there is no undeclared state; the chosen encoding
    /// must resolve here.
    fn encodings_provided(&self) -> Vec<(String, Transform)> {
        vec![("identity".to_string(), identity_transform())]
    }

    /// Ordered languages this resource can produce, counted for `Vary`.
    fn languages_provided(&self) -> Vec<String> {
        Vec::new()
    }

    /// Custom `Vary` entries, appended after the standard ones.
    fn variances(&self) -> Vec<String> {
        Vec::new()
    }

    /// The entity tag for the current representation, unquoted.
    fn generate_etag(&self) -> Option<String> {
        None
    }

    /// When the representation expires.
    fn expires(&self) -> Option<SystemTime> {
        None
    }

    /// When the representation was last modified.
    fn last_modified(&self) -> Option<SystemTime> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    impl Resource for Minimal {}

    #[test]
    fn defaults_describe_an_inert_resource() {
        let minimal = Minimal;
        assert!(minimal.content_types_provided().is_empty());
        assert!(minimal.content_types_accepted().is_empty());
        assert!(minimal.charsets_provided().is_none());
        assert!(minimal.languages_provided().is_empty());
        assert!(minimal.variances().is_empty());
        assert!(minimal.generate_etag().is_none());
        assert!(minimal.expires().is_none());
        assert!(minimal.last_modified().is_none());
    }

    #[test]
    fn default_encoding_is_identity() {
        let encodings = Minimal.encodings_provided();
        assert_eq!(encodings.len(), 1);
        assert_eq!(encodings[0].0, "identity");

        let chunk = bytes::Bytes::from("unchanged");
        assert_eq!((encodings[0].1)(chunk.clone()), chunk);
    }
}
