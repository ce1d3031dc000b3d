//! XML serializer - document arena back to indented XML text
//!
//! Layout rules per element:
//! - no nested blocks and no text: `<tag a="v"/>`
//! - text only: `<tag a="v">t1 t2</tag>` (text runs joined with one space)
//! - otherwise a block: open tag, one line per child, close tag
//!
//! Comments and processing instructions are block children, so an element
//! holding only a comment still renders as a block and keeps it.

use crate::arena::DocumentArena;
use crate::error::Result;
use crate::types::*;
use crate::utils::indent;
use serde::{Deserialize, Serialize};

/// Serializer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Spaces per nesting level below the root
    pub indent_width: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// Arena to XML text
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    config: SerializerConfig,
}

enum Step {
    Open(NodeId, usize),
    Close(NodeId, usize),
}

impl XmlSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize all top-level entries in order
    pub fn serialize(&self, arena: &DocumentArena) -> Result<String> {
        let mut output = String::with_capacity(arena.len() * 16);

        for &node_id in arena.top_level() {
            self.serialize_node(arena, node_id, &mut output)?;
        }

        Ok(output)
    }

    /// Serialize one subtree (iterative, explicit stack)
    pub fn serialize_node(
        &self,
        arena: &DocumentArena,
        node_id: NodeId,
        output: &mut String,
    ) -> Result<()> {
        let mut stack = vec![Step::Open(node_id, 0)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(id, depth) => {
                    let node = arena.get(id)?;
                    let indent = indent(depth, self.config.indent_width);

                    match &node.kind {
                        NodeKind::ProcInstr(raw) => {
                            output.push_str(&indent);
                            output.push_str(raw);
                            output.push('\n');
                        }
                        NodeKind::Comment(content) => {
                            output.push_str(&indent);
                            output.push_str("<!--");
                            output.push_str(content);
                            output.push_str("-->\n");
                        }
                        NodeKind::Text(content) => {
                            output.push_str(&indent);
                            output.push_str(content);
                            output.push('\n');
                        }
                        // Written by the owning element's open tag
                        NodeKind::Attribute { .. } => {}
                        NodeKind::Element { name } => {
                            let children = arena.children(id)?;
                            let mut has_block = false;
                            let mut texts = Vec::new();

                            output.push_str(&indent);
                            output.push('<');
                            output.push_str(name);
                            for child in &children {
                                match &child.kind {
                                    NodeKind::Attribute { name, value } => {
                                        let quote = attribute_quote(value);
                                        output.push(' ');
                                        output.push_str(name);
                                        output.push('=');
                                        output.push(quote);
                                        output.push_str(value);
                                        output.push(quote);
                                    }
                                    NodeKind::Text(content) => texts.push(content.as_str()),
                                    _ => has_block = true,
                                }
                            }

                            if has_block {
                                output.push_str(">\n");
                                stack.push(Step::Close(id, depth));
                                for child in children.iter().rev().filter(|c| !c.is_attribute()) {
                                    stack.push(Step::Open(child.node_id, depth + 1));
                                }
                            } else if texts.is_empty() {
                                output.push_str("/>\n");
                            } else {
                                output.push('>');
                                output.push_str(&texts.join(" "));
                                output.push_str("</");
                                output.push_str(name);
                                output.push_str(">\n");
                            }
                        }
                    }
                }
                Step::Close(id, depth) => {
                    let node = arena.get(id)?;
                    if let Some(name) = node.tag_name() {
                        output.push_str(&indent(depth, self.config.indent_width));
                        output.push_str("</");
                        output.push_str(name);
                        output.push_str(">\n");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Double quotes unless the value itself holds one (and no single quote).
/// Values are written verbatim, so a value with both cannot round trip.
fn attribute_quote(value: &str) -> char {
    if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::json;
    use serde_json::json;

    fn render(value: serde_json::Value) -> String {
        let arena = json::decode(&value).unwrap();
        XmlSerializer::new().serialize(&arena).unwrap()
    }

    #[test]
    fn test_minimal() {
        assert_eq!(render(json!({ "a": [] })), "<a/>\n");
    }

    #[test]
    fn test_declaration_and_attributes() {
        let output = render(json!({
            "#PROC_INSTR": "<?xml version=\"1.0\"?>",
            "a": [{ "@myAttr": "123" }]
        }));
        assert_eq!(output, "<?xml version=\"1.0\"?>\n<a myAttr=\"123\"/>\n");
    }

    #[test]
    fn test_text_node() {
        let output = render(json!({
            "a": [{ "@myAttr": "123" }, { "#TEXT": "abcd" }]
        }));
        assert_eq!(output, "<a myAttr=\"123\">abcd</a>\n");
    }

    #[test]
    fn test_text_runs_joined() {
        let output = render(json!({ "a": [{ "#TEXT": "one" }, { "#TEXT": "two" }] }));
        assert_eq!(output, "<a>one two</a>\n");
    }

    #[test]
    fn test_attribute_quote_follows_value() {
        let output = render(json!({
            "a": [{ "@x": "say \"hi\"" }, { "@y": "it's" }, { "@z": "plain" }]
        }));
        assert_eq!(output, "<a x='say \"hi\"' y=\"it's\" z=\"plain\"/>\n");
    }

    #[test]
    fn test_child_elements_block() {
        let output = render(json!({
            "a": [{ "@myAttr": "123" }, { "b": [] }]
        }));
        assert_eq!(output, "<a myAttr=\"123\">\n    <b/>\n</a>\n");
    }

    #[test]
    fn test_nested_indentation_and_mixed_content() {
        let output = render(json!({
            "a": [
                { "b": [{ "c": [{ "#TEXT": "deep" }] }] },
                { "#TEXT": "tail" },
                { "#COMMENT": " note " }
            ]
        }));
        assert_eq!(
            output,
            "<a>\n    <b>\n        <c>deep</c>\n    </b>\n    tail\n    <!-- note -->\n</a>\n"
        );
    }

    #[test]
    fn test_comment_only_element_keeps_comment() {
        let output = render(json!({ "a": [{ "#COMMENT": "x" }] }));
        assert_eq!(output, "<a>\n    <!--x-->\n</a>\n");
    }

    #[test]
    fn test_top_level_comment() {
        let output = render(json!([{ "#COMMENT": " head " }, { "a": [] }]));
        assert_eq!(output, "<!-- head -->\n<a/>\n");
    }

    #[test]
    fn test_custom_indent_width() {
        let arena = TreeBuilder::parse("<a><b/></a>").unwrap().arena;
        let output = XmlSerializer::with_config(SerializerConfig { indent_width: 2 })
            .serialize(&arena)
            .unwrap();
        assert_eq!(output, "<a>\n  <b/>\n</a>\n");
    }

    #[test]
    fn test_deep_document_does_not_recurse() {
        let depth = 20_000;
        let input = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));
        let arena = TreeBuilder::parse(&input).unwrap().arena;
        let output = XmlSerializer::with_config(SerializerConfig { indent_width: 0 })
            .serialize(&arena)
            .unwrap();
        assert_eq!(output.lines().count(), 2 * depth - 1);
    }
}
