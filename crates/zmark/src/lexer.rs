//! Character-level scanning

pub mod cursor;

pub use cursor::Cursor;

/// Which quote characters hide `<`/`>` from the balanced scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quotes {
    Double,
    Both,
}

impl Quotes {
    const fn opens(self, b: u8) -> bool {
        match self {
            Self::Double => b == b'"',
            Self::Both => b == b'"' || b == b'\'',
        }
    }
}

/// Length of the construct starting at `<`, up to the `>` that brings the
/// nesting depth back to zero
pub fn balanced_len(input: &[u8], quotes: Quotes) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = 0;
    while let Some(&b) = input.get(idx) {
        if idx > 0 && quotes.opens(b) {
            let close = input.get(idx + 1..)?.iter().position(|&c| c == b)?;
            idx += close + 2;
            continue;
        }
        match b {
            b'<' => depth += 1,
            b'>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_nested() {
        assert_eq!(balanced_len(b"<!DOCTYPE a [<!ENTITY b>]> tail", Quotes::Double), Some(26));
        assert_eq!(balanced_len(b"<a b='>'>", Quotes::Both), Some(9));
        assert_eq!(balanced_len(b"<a b='>'>", Quotes::Double), Some(7));
    }

    #[test]
    fn test_balanced_unterminated() {
        assert_eq!(balanced_len(b"<a <b>", Quotes::Both), None);
        assert_eq!(balanced_len(b"<a b=\">", Quotes::Both), None);
    }
}
