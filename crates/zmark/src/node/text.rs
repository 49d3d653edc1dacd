//! Text leaves

use std::borrow::Cow;

use crate::chars::{fold_whitespace, is_space};
use crate::entity::{decode_with, encode, scan_reference};

/// Character data, stored in escaped form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Text {
    raw: String,
}

impl Text {
    /// Escape `plain` and store it
    pub fn new(plain: &str) -> Self {
        Self {
            raw: encode(plain).into_owned(),
        }
    }

    /// Store already-escaped text as-is
    ///
    /// A `<`, or an `&` that does not start a reference, is still escaped so
    /// the text cannot open markup when serialized.
    pub fn from_encoded(escaped: impl Into<String>) -> Self {
        let raw = escaped.into();
        let bytes = raw.as_bytes();
        if (0..bytes.len()).any(|idx| is_stray(bytes, idx)) {
            return Self {
                raw: escape_stray(&raw),
            };
        }
        Self { raw }
    }

    /// The escaped form, as serialized
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The plain (unescaped) form
    pub fn decoded(&self) -> Cow<'_, str> {
        decode_with(&self.raw, false)
    }

    /// The plain form, also resolving HTML named entities
    pub fn decoded_with(&self, extended: bool) -> Cow<'_, str> {
        decode_with(&self.raw, extended)
    }

    pub fn is_whitespace(&self) -> bool {
        self.raw.bytes().all(is_space)
    }

    /// Collapse whitespace runs in place
    pub fn fold(&mut self) {
        self.raw = fold_whitespace(&self.raw);
    }

    pub(crate) fn push_encoded(&mut self, escaped: &str) {
        self.raw.push_str(escaped);
    }

    pub(crate) fn prepend_encoded(&mut self, escaped: &str) {
        self.raw.insert_str(0, escaped);
    }
}

fn is_stray(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx) {
        Some(b'<') => true,
        Some(b'&') => scan_reference(bytes.get(idx..).unwrap_or_default()).is_none(),
        _ => false,
    }
}

fn escape_stray(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len() + 8);
    for (idx, ch) in escaped.char_indices() {
        if is_stray(escaped.as_bytes(), idx) {
            out.push_str(if ch == '<' { "&lt;" } else { "&amp;" });
        } else {
            out.push(ch);
        }
    }
    out
}
