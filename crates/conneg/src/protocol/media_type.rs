//! Media-type values and wildcard matching.
//!
//! Wraps `mime::Mime` with the match predicate the negotiation pipeline
//! needs: exact match, subtype wildcard (`type/*`), full wildcard (`*/*`),
//! and pattern-directed parameter comparison.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mime::Mime;

use crate::protocol::error::MediaTypeError;

/// A parsed media type: `{type, subtype, parameters}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    inner: Mime,
}

impl MediaType {
    /// Parses a content-type string into a media type.
    ///
    /// Surrounding whitespace is tolerated; anything `mime` rejects is an
    /// invalid media type.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        input.trim().parse::<Mime>().map(Self::from).map_err(|_| MediaTypeError::invalid(input))
    }

    /// The top-level type, e.g. `application` in `application/json`.
    pub fn type_(&self) -> &str {
        self.inner.type_().as_str()
    }

    /// The subtype, e.g. `json` in `application/json`.
    pub fn subtype(&self) -> &str {
        self.inner.subtype().as_str()
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> &str {
        self.inner.essence_str()
    }

    /// Matches this media type against a pattern.
    ///
    /// `*/*` matches anything; `type/*` matches on the top-level type;
    /// otherwise type and subtype must match exactly. Parameters are ignored
    /// unless the pattern specifies them, in which case every pattern
    /// parameter must be present on `self` with an equal value.
    pub fn matches(&self, pattern: &MediaType) -> bool {
        if pattern.type_() != mime::STAR.as_str() {
            if pattern.type_() != self.type_() {
                return false;
            }
            if pattern.subtype() != mime::STAR.as_str() && pattern.subtype() != self.subtype() {
                return false;
            }
        }

        pattern
            .inner
            .params()
            .all(|(name, value)| self.inner.get_param(name.as_str()).is_some_and(|found| found.as_str() == value.as_str()))
    }
}

impl From<Mime> for MediaType {
    fn from(inner: Mime) -> Self {
        Self { inner }
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}
