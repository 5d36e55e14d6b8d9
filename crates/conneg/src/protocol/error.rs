use thiserror::Error;

/// Errors surfaced by the request model.
///
/// Tolerated malformed input (unparsable conditional dates, malformed
/// entity-tag lists) never reaches this type; those degrade to "absent".
/// Only contract violations are represented here.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no such derived accessor: {token}")]
    NoSuchAccessor { token: String },
}

impl RequestError {
    pub fn no_such_accessor<S: ToString>(token: S) -> Self {
        Self::NoSuchAccessor { token: token.to_string() }
    }
}

/// Media-type parse failure.
#[derive(Debug, Error)]
pub enum MediaTypeError {
    #[error("invalid media type: {input}")]
    Invalid { input: String },
}

impl MediaTypeError {
    pub fn invalid<S: ToString>(input: S) -> Self {
        Self::Invalid { input: input.to_string() }
    }
}

/// Errors from the body-encoding step.
///
/// The chosen charset and encoding tokens are decided upstream, so a failed
/// lookup in the resource's transform tables is a contract violation between
/// the decision graph and the resource, not a negotiation outcome.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("charset {name:?} is not provided by the resource")]
    UnknownCharset { name: String },

    #[error("encoding {name:?} is not provided by the resource")]
    UnknownEncoding { name: String },
}

impl EncodeError {
    pub fn unknown_charset<S: ToString>(name: S) -> Self {
        Self::UnknownCharset { name: name.to_string() }
    }

    pub fn unknown_encoding<S: ToString>(name: S) -> Self {
        Self::UnknownEncoding { name: name.to_string() }
    }
}
