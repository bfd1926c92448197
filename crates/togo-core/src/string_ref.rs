//! Non-owning string reference.
//!
//! `StrRef` is a `(ptr, len)` pair over UTF-8 bytes. Unlike `&str` from the
//! standard library it carries no lifetime-checked NUL-termination
//! guarantee: constructing one from a bounded literal excludes a trailing
//! NUL byte if present, and constructing one from a C string probes for the
//! terminator to determine the length.

use std::fmt;

/// Borrowed, non-owning reference to a run of UTF-8 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrRef<'a>(&'a str);

impl<'a> StrRef<'a> {
    /// Wraps a full Rust string slice verbatim.
    #[must_use]
    pub const fn new(s: &'a str) -> Self {
        Self(s)
    }

    /// Wraps a bounded byte literal, excluding a single trailing NUL if
    /// present, e.g. `StrRef::from_bounded(b"hello\0")` has length 5.
    ///
    /// # Panics
    /// Panics if the bytes (sans trailing NUL) are not valid UTF-8.
    #[must_use]
    pub fn from_bounded(bytes: &'a [u8]) -> Self {
        let trimmed = match bytes.split_last() {
            Some((&0, rest)) => rest,
            _ => bytes,
        };
        Self(std::str::from_utf8(trimmed).expect("StrRef::from_bounded: invalid utf-8"))
    }

    /// Wraps a NUL-terminated C string, probing for its length.
    ///
    /// # Panics
    /// Panics if `ptr` is null, there is no NUL within `isize::MAX` bytes, or
    /// the bytes are not valid UTF-8.
    ///
    /// # Safety
    /// `ptr` must point to a valid, NUL-terminated byte sequence that lives
    /// at least as long as `'a`.
    #[must_use]
    pub unsafe fn from_c_str(ptr: *const u8) -> Self {
        assert!(!ptr.is_null(), "StrRef::from_c_str: null pointer");
        let mut len = 0usize;
        while *ptr.add(len) != 0 {
            len += 1;
        }
        let bytes = std::slice::from_raw_parts(ptr, len);
        Self(std::str::from_utf8(bytes).expect("StrRef::from_c_str: invalid utf-8"))
    }

    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> From<&'a str> for StrRef<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for StrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl fmt::Display for StrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_excludes_trailing_nul() {
        let s = StrRef::from_bounded(b"abc\0");
        assert_eq!(s.as_str(), "abc");
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn bounded_without_nul_keeps_full_length() {
        let s = StrRef::from_bounded(b"abc");
        assert_eq!(s.as_str(), "abc");
    }

    #[test]
    fn c_str_probes_length() {
        let data = b"hello\0trailing-garbage";
        let s = unsafe { StrRef::from_c_str(data.as_ptr()) };
        assert_eq!(s.as_str(), "hello");
    }
}
