//! Conversion service - main entry point for XML ⇄ JSON
//!
//! This handles:
//! - XML text → arena (scanner + builder)
//! - arena → JSON value, compacted on request
//! - JSON value (either form) → arena → XML text

use crate::arena::DocumentArena;
use crate::builder::TreeBuilder;
use crate::compact;
use crate::error::Result;
use crate::json;
use crate::serializer::{SerializerConfig, XmlSerializer};
use crate::types::Token;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options for the XML → JSON direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Collapse sibling groups with unique keys into objects
    pub compact: bool,
}

/// Result of XML → JSON
#[derive(Debug, Clone)]
pub struct ParsedDocument<'a> {
    pub value: Value,
    /// Tokens accepted by the scanner but left out of the tree, in document order
    pub ignored_tokens: Vec<Token<'a>>,
}

/// Main conversion service
#[derive(Debug, Clone, Default)]
pub struct ConversionService {
    options: ConvertOptions,
    serializer: XmlSerializer,
}

impl ConversionService {
    /// Create service with default options
    pub fn new() -> Self {
        Self::with_config(ConvertOptions::default(), SerializerConfig::default())
    }

    /// Create service with custom options
    pub fn with_config(options: ConvertOptions, serializer: SerializerConfig) -> Self {
        Self {
            options,
            serializer: XmlSerializer::with_config(serializer),
        }
    }

    /// Parse XML text into the arena plus ignored tokens
    pub fn parse_tree<'a>(&self, text: &'a str) -> Result<(DocumentArena, Vec<Token<'a>>)> {
        let built = TreeBuilder::parse(text)?;
        tracing::debug!(
            "Built {} nodes, {} ignored tokens",
            built.arena.len(),
            built.ignored_tokens.len()
        );
        Ok((built.arena, built.ignored_tokens))
    }

    /// Parse XML text into its JSON representation
    pub fn parse<'a>(&self, text: &'a str) -> Result<ParsedDocument<'a>> {
        let (arena, ignored_tokens) = self.parse_tree(text)?;
        let mut value = json::encode(&arena)?;
        if self.options.compact {
            value = compact::compact(value);
        }
        Ok(ParsedDocument {
            value,
            ignored_tokens,
        })
    }

    /// Serialize an arena as XML text
    pub fn render_tree(&self, arena: &DocumentArena) -> Result<String> {
        self.serializer.serialize(arena)
    }

    /// Render a JSON value (array or compacted form) as XML text
    pub fn render(&self, value: &Value) -> Result<String> {
        let arena = json::decode(value)?;
        self.render_tree(&arena)
    }
}

/// Parse XML text with the given options
pub fn parse_document<'a>(text: &'a str, options: &ConvertOptions) -> Result<ParsedDocument<'a>> {
    ConversionService::with_config(options.clone(), SerializerConfig::default()).parse(text)
}

/// Render a JSON value as XML with the default serializer settings
pub fn render_document(value: &Value) -> Result<String> {
    ConversionService::new().render(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::types::TokenKind;
    use serde_json::json;

    fn parse(input: &str) -> Value {
        parse_document(input, &ConvertOptions::default()).unwrap().value
    }

    fn parse_compact(input: &str) -> Value {
        parse_document(input, &ConvertOptions { compact: true })
            .unwrap()
            .value
    }

    #[test]
    fn test_minimal_document() {
        assert_eq!(parse("<a/>"), json!([{ "a": [] }]));
        assert_eq!(parse_compact("<a/>"), json!({ "a": {} }));
    }

    #[test]
    fn test_attribute() {
        assert_eq!(
            parse_compact("<a myAttr=\"123\"/>"),
            json!({ "a": { "@myAttr": "123" } })
        );
        assert_eq!(
            parse("<a myAttr=\"123\"/>"),
            json!([{ "a": [{ "@myAttr": "123" }] }])
        );
    }

    #[test]
    fn test_repeated_siblings_keep_array() {
        let input = "<?xml version=\"1.0\"?>\n<a><b/><b/><b/><b/><b/></a>";
        let value = parse(input);
        assert_eq!(value[1]["a"], json!([{ "b": [] }, { "b": [] }, { "b": [] }, { "b": [] }, { "b": [] }]));

        // The group of a stays an array; each empty b group compacts on its own
        let compacted = parse_compact(input);
        assert_eq!(compacted["a"].as_array().unwrap().len(), 5);
        assert_eq!(compacted["a"][0], json!({ "b": {} }));
        assert!(compacted.get("#PROC_INSTR").is_some());
    }

    #[test]
    fn test_text_and_comment() {
        let value = parse_compact("<?xml version=\"1.0\"?>\n<a>Dummy text<!-- note --></a>");
        assert_eq!(value["a"]["#TEXT"], "Dummy text");
        assert_eq!(value["a"]["#COMMENT"], " note ");
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse_document("<a><b>ABCD</a></b>", &ConvertOptions::default()).unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("\"b\""));
    }

    #[test]
    fn test_two_roots() {
        let err = parse_document("<a></a><b>ABCD</b>", &ConvertOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The root must have exactly ONE tag. Check for \"a, b\" tags."
        );
    }

    #[test]
    fn test_no_root() {
        for input in ["", "   \n\t  "] {
            let err = parse_document(input, &ConvertOptions::default()).unwrap_err();
            assert!(err.is_structural(), "input {input:?}");
        }
    }

    #[test]
    fn test_lexical_error() {
        let err = parse_document("<a>\n  <b $/></a>", &ConvertOptions::default()).unwrap_err();
        assert!(err.is_lexical());
        assert_eq!(err.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn test_ignored_tokens_reported() {
        let parsed =
            parse_document("<!DOCTYPE a><a/>", &ConvertOptions::default()).unwrap();
        assert_eq!(parsed.ignored_tokens.len(), 1);
        assert_eq!(parsed.ignored_tokens[0].kind, TokenKind::Doctype);
        assert_eq!(parsed.value, json!([{ "a": [] }]));
    }

    #[test]
    fn test_render_document() {
        let output = render_document(&json!({
            "#PROC_INSTR": "<?xml version=\"1.0\"?>",
            "a": { "@myAttr": "123", "#TEXT": "abcd" }
        }))
        .unwrap();
        assert_eq!(output, "<?xml version=\"1.0\"?>\n<a myAttr=\"123\">abcd</a>\n");
    }

    #[test]
    fn test_render_rejects_scalar() {
        let err = render_document(&json!(42)).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidShape(_)));
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let value = parse("\u{feff}<?xml version=\"1.0\"?><a/>");
        assert_eq!(
            value,
            json!([{ "#PROC_INSTR": "<?xml version=\"1.0\"?>" }, { "a": [] }])
        );
    }

    #[test]
    fn test_deep_documents_are_bounded() {
        let nested = |depth: usize| format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));

        for compact in [false, true] {
            let options = ConvertOptions { compact };
            let value = parse_document(&nested(json::MAX_DEPTH), &options).unwrap().value;
            assert!(render_document(&value).is_ok());

            let err = parse_document(&nested(20_000), &options).unwrap_err();
            assert!(err.is_structural(), "compact = {compact}");
        }

        // The arena side has no limit
        let service = ConversionService::new();
        let (arena, _) = service.parse_tree(&nested(20_000)).unwrap();
        assert_eq!(arena.len(), 20_000);
    }

    #[test]
    fn test_quoted_attribute_values_round_trip() {
        let input = r#"<a x='say "hi"' y="it's"/>"#;
        let value = parse(input);
        assert_eq!(
            value,
            json!([{ "a": [{ "@x": "say \"hi\"" }, { "@y": "it's" }] }])
        );
        assert_eq!(parse(&render_document(&value).unwrap()), value);
    }

    const ROUND_TRIP_DOCUMENTS: &[&str] = &[
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog id="c1">
    <!-- books -->
    <book lang="en">
        <title>Rust &amp; XML</title>
        <tag/>
        <tag/>
    </book>
    <note><![CDATA[raw <text>]]></note>
</catalog>
"#,
        // Mixed content
        "<p>Hello <b>bold</b> world<!-- c --><?pi x?></p>",
        "<a>x<![CDATA[y]]>z</a>",
        // Attribute-only root
        r#"<root a="1" b='2' c="x y"/>"#,
        // Top-level entries after the root
        "<a><b/></a>\n<!-- trailer -->\n<?pi end?>\n",
        // Quotes and entities kept literally
        r#"<a x='say "hi"'>&lt;tag&gt;</a>"#,
        "\u{feff}<a><a><a>deep</a></a></a>",
    ];

    #[test]
    fn test_round_trip_is_structurally_equal() {
        for compact in [false, true] {
            let service = ConversionService::with_config(
                ConvertOptions { compact },
                SerializerConfig::default(),
            );
            for input in ROUND_TRIP_DOCUMENTS {
                let first = service.parse(input).unwrap().value;
                let xml = service.render(&first).unwrap();
                let second = service.parse(&xml).unwrap().value;
                assert_eq!(first, second, "compact = {compact}, input {input:?}");

                // Rendering is stable after one pass
                let again = service.render(&second).unwrap();
                assert_eq!(xml, again, "compact = {compact}, input {input:?}");
            }
        }
    }
}
