//! Quoting utilities for quoted header tokens.
//!
//! Entity tags travel quoted on the wire (`ETag: "xyzzy"`, `If-Match: "a", "b"`).
//! These helpers convert between the quoted wire form and the opaque token
//! value. Both are pure functions over the input and never fail.

use std::borrow::Cow;

/// Returns true if `value` is wrapped in a single pair of double quotes
/// spanning the whole string.
fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

/// Strips one wrapping pair of double quotes from `value`.
///
/// A value that is not fully quoted is returned unchanged. Interior quotes
/// are left alone; only the outermost pair is removed.
pub fn unquote(value: &str) -> &str {
    if is_quoted(value) { &value[1..value.len() - 1] } else { value }
}

/// Wraps `value` in double quotes unless it is already fully quoted.
///
/// Used for entity-tag header values, which are always exchanged quoted.
pub fn ensure_quoted(value: &str) -> Cow<'_, str> {
    if is_quoted(value) { Cow::Borrowed(value) } else { Cow::Owned(format!("\"{value}\"")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("\"\"abc\"\""), "\"abc\"");
    }

    #[test]
    fn unquote_leaves_bare_values() {
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote(""), "");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"unterminated"), "\"unterminated");
    }

    #[test]
    fn ensure_quoted_wraps_bare_values() {
        assert_eq!(ensure_quoted("abc"), "\"abc\"");
        assert_eq!(ensure_quoted(""), "\"\"");
    }

    #[test]
    fn ensure_quoted_keeps_quoted_values() {
        assert_eq!(ensure_quoted("\"abc\""), "\"abc\"");
    }

    #[test]
    fn round_trip() {
        for value in ["", "a", "abc", "with space", "semi\"interior", "\""] {
            assert_eq!(unquote(&ensure_quoted(value)), value);
        }
    }
}
