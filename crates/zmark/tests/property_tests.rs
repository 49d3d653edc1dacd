//! Property-based tests for the markup codec and parser
//!
//! These tests use proptest to verify:
//! 1. Entity codec: decode(encode(s)) == s and encoded text has no raw specials
//! 2. Whitespace folding is idempotent
//! 3. Serialized output reparses to the same serialization
//! 4. Parsing the output of a parsed tree gives back the same tree
//! 5. Arbitrary input never panics

use proptest::prelude::*;
use zmark::chars::fold_whitespace;
use zmark::entity::{decode, encode};
use zmark::{parse, parse_with_config, Config, Document, Element, Node};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_.-]{0,8}"
}

/// Small trees of elements and text
fn element_strategy() -> impl Strategy<Value = Element> {
    let leaf = (name_strategy(), "[^\\x00\\n]{1,12}").prop_filter_map("valid leaf", |(name, text)| {
        let mut el = Element::new(&name).ok()?;
        el.append(Node::text(&text)).ok()?;
        Some(el)
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            prop::collection::vec((name_strategy(), "[^\\x00]{0,8}"), 0..3),
            prop::collection::vec(inner, 0..4),
        )
            .prop_filter_map("valid element", |(name, attrs, children)| {
                let mut el = Element::new(&name).ok()?;
                for (key, value) in attrs {
                    el.set_attr(&key, value).ok()?;
                }
                for child in children {
                    el.append(child).ok()?;
                }
                Some(el)
            })
    })
}

fn attr_strategy() -> impl Strategy<Value = String> {
    let value = prop_oneof![
        "\"[a-z <>&']{0,6}\"",
        "'[a-z \"]{0,4}'",
        "[a-z]{1,4}",
    ];
    (
        prop::sample::select(vec!["id", "class", "x"]),
        prop::option::weighted(0.8, value),
    )
        .prop_map(|(key, value)| match value {
            Some(value) => format!(" {key}={value}"),
            None => format!(" {key}"),
        })
}

/// Markup that is mostly well formed, mixing every construct the parser reads
fn content_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        6 => "[a-zA-Z0-9 .,>\t\n]{1,10}",
        3 => prop::sample::select(vec!["&amp;", "&lt;", "&#65;", "&#x20;", "&nbsp;", "&copy;"])
            .prop_map(String::from),
        1 => prop::sample::select(vec![" & ", " < "]).prop_map(String::from),
        2 => prop::sample::select(vec!["<!-- note -->", "<![CDATA[a<b]]>", "<?pi data?>"])
            .prop_map(String::from),
        1 => prop::sample::select(vec!["<br>", "<img src=x>", "<hr/>"]).prop_map(String::from),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        (
            prop::sample::select(vec!["a", "b", "P", "div", "Span"]),
            prop::collection::vec(attr_strategy(), 0..3),
            prop::collection::vec(inner, 0..5),
            prop::bool::weighted(0.9),
        )
            .prop_map(|(name, attrs, children, closed)| {
                let attrs = attrs.concat();
                let body = children.concat();
                if closed {
                    format!("<{name}{attrs}>{body}</{name}>")
                } else {
                    format!("<{name}{attrs}>{body}")
                }
            })
    })
}

proptest! {
    #[test]
    fn prop_codec_roundtrip(s in "[^\\x00]{0,64}") {
        let encoded = encode(&s);
        prop_assert_eq!(decode(&encoded), s.as_str());
    }

    #[test]
    fn prop_encoded_has_no_specials(s in any::<String>()) {
        let encoded = encode(&s);
        prop_assert!(!encoded.contains(['<', '>', '"', '\'']));
        for (idx, _) in encoded.match_indices('&') {
            let tail = encoded.get(idx..).unwrap_or_default();
            prop_assert!(tail.contains(';'));
        }
    }

    #[test]
    fn prop_fold_idempotent(s in "[ a-z\t\r\n]{0,40}") {
        let once = fold_whitespace(&s);
        prop_assert_eq!(fold_whitespace(&once), once.clone());
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn prop_built_tree_reparses(root in element_strategy()) {
        let mut doc = Document::new();
        prop_assert!(doc.append(root).is_ok());
        let first = doc.outer();
        let reparsed = parse(&first);
        prop_assert!(reparsed.is_ok(), "{first}: {reparsed:?}");
        let second = reparsed.map(|d| d.outer()).unwrap_or_default();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_parsed_tree_reparses_identically(
        body in content_strategy(),
        decl in any::<bool>(),
        dtd in any::<bool>(),
        line_breaks in any::<bool>(),
    ) {
        let brk = if line_breaks { "\n" } else { "" };
        let mut input = String::new();
        if decl {
            input.push_str("<?xml version=\"1.0\"?>");
            input.push_str(brk);
        }
        if dtd {
            input.push_str("<!DOCTYPE root>");
            input.push_str(brk);
        }
        input.push_str(&format!("<root>{body}</root>"));

        for config in [Config::xml(), Config::html()] {
            let Ok(first) = parse_with_config(&input, config) else {
                continue;
            };
            let output = first.outer();
            let second = parse_with_config(&output, config);
            prop_assert!(second.is_ok(), "{output}: {second:?}");
            if let Ok(second) = second {
                prop_assert_eq!(first.children(), second.children(), "{}", output);
            }
        }
    }

    #[test]
    fn prop_arbitrary_input_never_panics(s in ".{0,64}") {
        let _ = parse(&s);
        let _ = parse_with_config(&s, Config::html());
    }

    #[test]
    fn prop_markup_like_input_never_panics(s in "[<>/!?&;=\"' a-z\\-\\[\\]]{0,64}") {
        let _ = parse(&s);
        let _ = parse_with_config(&s, Config::html());
    }
}
