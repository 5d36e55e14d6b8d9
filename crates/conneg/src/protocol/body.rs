//! Response body shapes and lazy per-chunk transforms.
//!
//! A response body arrives in one of four producer shapes, and the encoding
//! step must treat them uniformly without destroying their laziness:
//!
//! - [`Body::Full`]: a complete, already-materialized buffer
//! - [`Body::Chunks`]: a finite sequence of chunks, known but not
//!   pre-concatenated
//! - [`Body::Stream`]: a pull-driven producer that yields chunks one at a
//!   time; one pull drives it exactly one step
//! - [`Body::Deferred`]: a zero-argument callable whose invocation is put off
//!   until the body is actually consumed
//!
//! The shape also decides framing downstream: only a [`Body::Full`] body has
//! a knowable byte length, everything else goes out chunked.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use bytes::Bytes;

/// A chunk-level transform applied to body content while it is pulled.
///
/// Charset conversions and content encodings are both expressed this way;
/// the resource supplies them, the pipeline composes them.
pub type Transform = Arc<dyn Fn(Bytes) -> Bytes + Send + Sync>;

/// The identity transform: chunks pass through untouched.
pub fn identity_transform() -> Transform {
    Arc::new(|chunk| chunk)
}

/// A pull-driven chunk producer.
///
/// Each `next()` call drives the underlying producer exactly one step. If
/// the consumer stops pulling (client disconnect), dropping the stream
/// abandons the producer without forcing it to completion.
pub struct BodyStream {
    inner: Box<dyn Iterator<Item = Bytes> + Send>,
}

impl BodyStream {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Bytes> + Send + 'static,
    {
        Self { inner: Box::new(iter) }
    }
}

impl Iterator for BodyStream {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        self.inner.next()
    }
}

impl Debug for BodyStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

/// A body whose production is deferred until consumption.
///
/// Invoking the callable yields a new [`Body`] in any shape, including
/// another deferred one; resolution is repeated at consumption time until a
/// concrete shape appears.
pub struct DeferredBody {
    inner: Box<dyn FnOnce() -> Body + Send>,
}

impl DeferredBody {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Body + Send + 'static,
    {
        Self { inner: Box::new(f) }
    }

    /// Invokes the deferred producer, yielding the next body shape.
    pub fn resolve(self) -> Body {
        (self.inner)()
    }
}

impl Debug for DeferredBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredBody").finish_non_exhaustive()
    }
}

/// A response body in one of the four producer shapes (or absent).
#[derive(Debug)]
pub enum Body {
    /// No body.
    Empty,
    /// A fixed, fully-materialized buffer.
    Full(Bytes),
    /// A finite sequence of chunks.
    Chunks(VecDeque<Bytes>),
    /// A lazy, pull-driven producer.
    Stream(BodyStream),
    /// A deferred producer, invoked on first consumption.
    Deferred(DeferredBody),
}

impl Body {
    /// Returns true if the body is known to hold no content.
    ///
    /// A stream or deferred body is never considered empty: deciding would
    /// mean driving the producer, which only the final consumer may do.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Full(buf) => buf.is_empty(),
            Body::Chunks(chunks) => chunks.is_empty(),
            Body::Stream(_) | Body::Deferred(_) => false,
        }
    }

    /// Returns true if the body is a single fixed buffer.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Body::Full(_))
    }

    /// Returns the fixed buffer, if this body is one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Full(buf) => Some(buf),
            _ => None,
        }
    }

    /// Replaces the body with [`Body::Empty`] and returns the previous value.
    pub fn take(&mut self) -> Body {
        std::mem::replace(self, Body::Empty)
    }

    /// Applies `charset` then `encoding` to the body content, preserving the
    /// producer's laziness.
    ///
    /// A fixed buffer is transformed eagerly and stays fixed. A finite
    /// sequence or a stream is wrapped so each chunk is transformed as it is
    /// pulled, in producer-yield order, never more than one chunk ahead. A
    /// deferred body stays deferred; the produced body is run through the
    /// same wrapping when it finally appears.
    pub fn transformed(self, charset: Transform, encoding: Transform) -> Body {
        match self {
            Body::Empty => Body::Empty,
            Body::Full(buf) => Body::Full(encoding(charset(buf))),
            Body::Chunks(chunks) => {
                Body::Stream(BodyStream::new(chunks.into_iter().map(move |chunk| encoding(charset(chunk)))))
            }
            Body::Stream(stream) => Body::Stream(BodyStream::new(stream.map(move |chunk| encoding(charset(chunk))))),
            Body::Deferred(deferred) => {
                Body::Deferred(DeferredBody::new(move || deferred.resolve().transformed(charset, encoding)))
            }
        }
    }

    /// Flattens any shape into an iterator of chunks.
    ///
    /// This is the single consumption point used by the transport: deferred
    /// bodies are resolved on first pull, streams are driven one step per
    /// pull, and order is strictly producer-yield order.
    pub fn into_chunks(self) -> BodyChunks {
        BodyChunks { body: Some(self) }
    }
}

impl From<Bytes> for Body {
    fn from(buf: Bytes) -> Self {
        Body::Full(buf)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Full(Bytes::from(value))
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        if value.is_empty() { Body::Empty } else { Body::Full(Bytes::from_static(value.as_bytes())) }
    }
}

impl From<Vec<Bytes>> for Body {
    fn from(chunks: Vec<Bytes>) -> Self {
        Body::Chunks(chunks.into())
    }
}

impl From<VecDeque<Bytes>> for Body {
    fn from(chunks: VecDeque<Bytes>) -> Self {
        Body::Chunks(chunks)
    }
}

/// Iterator over the chunks of a consumed [`Body`].
#[derive(Debug)]
pub struct BodyChunks {
    body: Option<Body>,
}

impl Iterator for BodyChunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        loop {
            match self.body.take()? {
                Body::Empty => return None,
                Body::Full(buf) => return Some(buf),
                Body::Chunks(mut chunks) => {
                    let chunk = chunks.pop_front()?;
                    self.body = Some(Body::Chunks(chunks));
                    return Some(chunk);
                }
                Body::Stream(mut stream) => {
                    let chunk = stream.next()?;
                    self.body = Some(Body::Stream(stream));
                    return Some(chunk);
                }
                Body::Deferred(deferred) => {
                    self.body = Some(deferred.resolve());
                }
            }
        }
    }
}
