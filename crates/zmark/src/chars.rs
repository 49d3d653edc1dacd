//! Byte classification for the markup grammar

/// First byte of a name: ASCII letter, `_`, `:` or any non-ASCII byte
pub const fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

pub const fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

pub const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Bytes that end a run of plain text
pub const fn is_special(b: u8) -> bool {
    matches!(b, b'<' | b'&')
}

/// C0 controls other than tab, CR and LF, plus DEL
pub const fn is_escaped_control(b: u8) -> bool {
    (b < 0x20 && !matches!(b, b'\t' | b'\r' | b'\n')) || b == 0x7f
}

/// Check a full string against the name grammar
pub fn is_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(first) if is_name_start(first) => bytes.all(is_name_char),
        _ => false,
    }
}

/// Length of the name at the start of `input`, zero if there is none
pub fn name_len(input: &[u8]) -> usize {
    match input.first() {
        Some(&first) if is_name_start(first) => input
            .iter()
            .position(|&b| !is_name_char(b))
            .unwrap_or(input.len()),
        _ => 0,
    }
}

/// Collapse each run of tab/space/CR/LF into one space
pub fn fold_whitespace(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    let mut in_space = false;
    for ch in s.chars() {
        if matches!(ch, ' ' | '\t' | '\r' | '\n') {
            if !in_space {
                folded.push(' ');
            }
            in_space = true;
        } else {
            folded.push(ch);
            in_space = false;
        }
    }
    folded
}
