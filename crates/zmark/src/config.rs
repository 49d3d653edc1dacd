//! Parse and serialization options

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nesting limit used by both presets
pub const DEFAULT_MAX_DEPTH: u16 = 256;

/// Parse options. `Default` is the strict XML preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Implicitly close open elements when a closing tag does not match the
    /// innermost one, and tolerate elements still open at end of input
    pub auto_close: bool,
    /// Keep comment nodes instead of discarding them
    pub keep_comments: bool,
    /// Text handed to node constructors is already escaped
    pub already_encoded: bool,
    /// Collapse whitespace runs in text to a single space
    pub fold_whitespace: bool,
    /// Lowercase element and attribute names
    pub case_insensitive: bool,
    /// Allow attributes without `=value`
    pub key_only_attributes: bool,
    /// Do not synthesize `<?xml ...?>` when the input has none
    pub suppress_default_decl: bool,
    /// Treat HTML void element names as self-closing
    pub self_closing_void: bool,
    /// Decode HTML named entities beyond the five predefined ones
    pub extended_entities: bool,
    /// Deepest element nesting accepted; 0 disables the limit
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::xml()
    }
}

impl Config {
    /// Strict XML preset
    pub const fn xml() -> Self {
        Self {
            auto_close: false,
            keep_comments: false,
            already_encoded: false,
            fold_whitespace: false,
            case_insensitive: false,
            key_only_attributes: false,
            suppress_default_decl: false,
            self_closing_void: false,
            extended_entities: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Permissive HTML-like preset
    pub const fn html() -> Self {
        Self {
            auto_close: true,
            keep_comments: false,
            already_encoded: false,
            fold_whitespace: true,
            case_insensitive: true,
            key_only_attributes: true,
            suppress_default_decl: true,
            self_closing_void: true,
            extended_entities: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub const fn with_auto_close(mut self, on: bool) -> Self {
        self.auto_close = on;
        self
    }

    pub const fn with_keep_comments(mut self, on: bool) -> Self {
        self.keep_comments = on;
        self
    }

    pub const fn with_already_encoded(mut self, on: bool) -> Self {
        self.already_encoded = on;
        self
    }

    pub const fn with_fold_whitespace(mut self, on: bool) -> Self {
        self.fold_whitespace = on;
        self
    }

    pub const fn with_case_insensitive(mut self, on: bool) -> Self {
        self.case_insensitive = on;
        self
    }

    pub const fn with_key_only_attributes(mut self, on: bool) -> Self {
        self.key_only_attributes = on;
        self
    }

    pub const fn with_suppress_default_decl(mut self, on: bool) -> Self {
        self.suppress_default_decl = on;
        self
    }

    pub const fn with_self_closing_void(mut self, on: bool) -> Self {
        self.self_closing_void = on;
        self
    }

    pub const fn with_extended_entities(mut self, on: bool) -> Self {
        self.extended_entities = on;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Serialization options. The default rendering is fully explicit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FormatConfig {
    /// Render `key` instead of `key="key"`
    pub bare_attributes: bool,
    /// Render childless void elements as `<br>` instead of `<br />`
    pub void_tags: bool,
}

impl FormatConfig {
    pub const fn html() -> Self {
        Self {
            bare_attributes: true,
            void_tags: true,
        }
    }
}

/// HTML elements that never have content.
///
/// The table is fixed: `self_closing_void` and `FormatConfig::void_tags` both
/// consult it, and neither can be pointed at a different list.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Whether `name` is an HTML void element, compared ASCII case-insensitively
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_xml() {
        assert_eq!(Config::default(), Config::xml());
    }

    #[test]
    fn test_html_preset() {
        let html = Config::html();
        assert!(html.auto_close);
        assert!(!html.keep_comments);
        assert!(!html.already_encoded);
        assert!(html.extended_entities);
    }

    #[test]
    fn test_builder() {
        let config = Config::xml().with_keep_comments(true).with_auto_close(true);
        assert!(config.keep_comments);
        assert!(config.auto_close);
        assert!(!config.fold_whitespace);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.with_max_depth(0).max_depth, 0);
    }

    #[test]
    fn test_void_lookup() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
    }
}
