//! Entity encoding and decoding
//!
//! Handles:
//! - The five predefined entities: `&amp; &lt; &gt; &quot; &apos;`
//! - Numeric character references: `&#123;` and `&#x7B;`
//! - Optionally the HTML 4 named entity table (`&nbsp;`, `&copy;`, ...)
//!
//! Unrecognised references are not errors; they pass through verbatim.

pub mod named;

use std::borrow::Cow;
use std::fmt::Write;

use crate::chars::{is_escaped_control, name_len};

/// A complete `&...;` reference found at the start of some input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `&#NNN;` or `&#xHH;`, already mapped to a character
    Numeric(char),
    /// `&name;` (the name without delimiters)
    Named(&'a str),
}

/// Escape markup-significant characters and control bytes.
///
/// Tab, CR and LF are kept; non-ASCII text is never escaped.
pub fn encode(plain: &str) -> Cow<'_, str> {
    if !plain.bytes().any(needs_escape) {
        return Cow::Borrowed(plain);
    }

    let mut out = String::with_capacity(plain.len() + 8);
    for ch in plain.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if u8::try_from(c).is_ok_and(is_escaped_control) => {
                let _ = write!(out, "&#x{:02X};", u32::from(c));
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

const fn needs_escape(b: u8) -> bool {
    matches!(b, b'&' | b'<' | b'>' | b'"' | b'\'') || is_escaped_control(b)
}

/// Decode predefined and numeric references
pub fn decode(escaped: &str) -> Cow<'_, str> {
    decode_with(escaped, false)
}

/// Decode references, consulting the HTML named table when `extended` is set
pub fn decode_with(escaped: &str, extended: bool) -> Cow<'_, str> {
    if !escaped.contains('&') {
        return Cow::Borrowed(escaped);
    }

    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(amp) = rest.find('&') {
        let (before, from_amp) = rest.split_at(amp);
        out.push_str(before);

        match scan_reference(from_amp.as_bytes()) {
            Some((len, reference)) => {
                match resolve(reference, extended) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(from_amp.get(..len).unwrap_or(from_amp)),
                }
                rest = from_amp.get(len..).unwrap_or_default();
            }
            None => {
                out.push('&');
                rest = from_amp.get(1..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Recognise a reference at the start of `input` (which begins with `&`).
///
/// Returns the byte length including `&` and `;`. `None` when the text is
/// not a plausible reference, in which case the `&` is literal.
pub fn scan_reference(input: &[u8]) -> Option<(usize, Reference<'_>)> {
    let body = input.strip_prefix(b"&")?;

    if let Some(numeric) = body.strip_prefix(b"#") {
        let (radix, digits) = match numeric.first() {
            Some(b'x' | b'X') => (16, numeric.get(1..)?),
            _ => (10, numeric),
        };
        let count = digits
            .iter()
            .position(|b| !char::from(*b).is_digit(radix))
            .unwrap_or(digits.len());
        if count == 0 || digits.get(count) != Some(&b';') {
            return None;
        }
        let text = std::str::from_utf8(digits.get(..count)?).ok()?;
        let ch = numeric_char(text, radix);
        let prefix = body.len() - digits.len();
        return Some((1 + prefix + count + 1, Reference::Numeric(ch)));
    }

    let len = name_len(body);
    if len == 0 || body.get(len) != Some(&b';') {
        return None;
    }
    let name = std::str::from_utf8(body.get(..len)?).ok()?;
    Some((len + 2, Reference::Named(name)))
}

/// Best-effort mapping of a numeric reference; out-of-range values become U+FFFD
fn numeric_char(digits: &str, radix: u32) -> char {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Map a predefined entity name to its character
pub fn predefined(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Resolve a reference to a character, if it names one
pub fn resolve(reference: Reference<'_>, extended: bool) -> Option<char> {
    match reference {
        Reference::Numeric(ch) => Some(ch),
        Reference::Named(name) => {
            predefined(name).or_else(|| extended.then(|| named::lookup(name)).flatten())
        }
    }
}
