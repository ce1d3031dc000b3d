//! Tree builder - token stream to document arena
//!
//! Single pass over the scanner output with one explicit stack. Each stack
//! entry is a node already allocated in the arena; `open` marks elements
//! whose closing tag has not been seen yet.
//!
//! ```text
//! <a x="1"><b/>text</a>
//!
//! after <b/>:   [a(open)] [b]
//! after text:   [a(open)] [b] [#TEXT]
//! after </a>:   [a] with children @x, b, #TEXT
//! ```
//!
//! A closing tag pops entries until it reaches the open element with the
//! same name. Open elements met on the way are folded in as children with
//! only their attributes; the entries above them stay their siblings.

use crate::arena::DocumentArena;
use crate::error::{ConversionError, Result};
use crate::scanner::Scanner;
use crate::types::{NodeId, NodeKind, Position, Token, TokenKind};

/// Arena plus the tokens the builder skipped on purpose
#[derive(Debug)]
pub struct BuiltDocument<'a> {
    pub arena: DocumentArena,
    pub ignored_tokens: Vec<Token<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    node_id: NodeId,
    open: bool,
}

/// State between `<` and `>`
#[derive(Debug)]
struct TagContext<'a> {
    start: Position,
    closing: bool,
    name: Option<Token<'a>>,
    attr_name: Option<Token<'a>>,
    saw_equal: bool,
    attributes: Vec<(Token<'a>, Token<'a>)>,
}

impl<'a> TagContext<'a> {
    fn new(start: Position) -> Self {
        Self {
            start,
            closing: false,
            name: None,
            attr_name: None,
            saw_equal: false,
            attributes: Vec::new(),
        }
    }
}

/// Adjacent text and entity tokens, trimmed when flushed
#[derive(Debug, Default)]
struct TextRun {
    content: String,
}

#[derive(Debug, Default)]
pub struct TreeBuilder<'a> {
    arena: DocumentArena,
    stack: Vec<StackEntry>,
    tag: Option<TagContext<'a>>,
    text: TextRun,
    ignored: Vec<Token<'a>>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan and build `text` in one go
    pub fn parse(text: &'a str) -> Result<BuiltDocument<'a>> {
        let mut builder = TreeBuilder::new();
        for token in Scanner::new(text) {
            builder.feed(token?)?;
        }
        builder.finish()
    }

    /// Consume one token
    pub fn feed(&mut self, token: Token<'a>) -> Result<()> {
        match token.kind {
            TokenKind::Text | TokenKind::Entity => {
                self.text.content.push_str(token.text);
            }
            TokenKind::LessThan => {
                self.flush_text();
                self.tag = Some(TagContext::new(token.position()));
            }
            TokenKind::Slash => {
                let marks_closing = match self.tag.as_mut() {
                    Some(tag) if tag.name.is_none() && !tag.closing => {
                        tag.closing = true;
                        true
                    }
                    _ => false,
                };
                if !marks_closing {
                    self.ignore(token);
                }
            }
            TokenKind::TagName | TokenKind::AttrName => self.on_name(token),
            TokenKind::Equal => {
                let expects_value = match self.tag.as_mut() {
                    Some(tag) if tag.attr_name.is_some() => {
                        tag.saw_equal = true;
                        true
                    }
                    _ => false,
                };
                if !expects_value {
                    self.ignore(token);
                }
            }
            TokenKind::AttrValueDouble | TokenKind::AttrValueSingle => self.on_value(token),
            TokenKind::SlashGreaterThan => self.on_self_close(token)?,
            TokenKind::GreaterThan => self.on_tag_end(token)?,
            TokenKind::CData => {
                self.flush_text();
                let content = token.text.trim();
                if !content.is_empty() {
                    self.push_node(NodeKind::Text(content.to_string()));
                }
            }
            TokenKind::Comment => {
                self.flush_text();
                let body = &token.text[4..token.text.len() - 3];
                self.push_node(NodeKind::Comment(body.to_string()));
            }
            TokenKind::ProcInstr => {
                self.flush_text();
                self.push_node(NodeKind::ProcInstr(token.text.to_string()));
            }
            TokenKind::Doctype => {
                self.flush_text();
                self.ignore(token);
            }
            TokenKind::Whitespace | TokenKind::Punct => self.ignore(token),
        }
        Ok(())
    }

    /// End of input: check the root count and hand out the arena
    pub fn finish(mut self) -> Result<BuiltDocument<'a>> {
        self.flush_text();

        if let Some(tag) = self.tag.take() {
            tracing::debug!("Unterminated tag at {} dropped", tag.start);
        }

        let roots: Vec<String> = self
            .stack
            .iter()
            .filter_map(|entry| self.arena.get(entry.node_id).ok())
            .filter(|node| !node.is_misc())
            .map(|node| match &node.kind {
                NodeKind::Text(text) => text.clone(),
                kind => kind.key(),
            })
            .collect();

        if roots.len() != 1 {
            return Err(ConversionError::structural(
                format!(
                    "The root must have exactly ONE tag. Check for \"{}\" tags.",
                    roots.join(", ")
                ),
                None,
            ));
        }

        for entry in std::mem::take(&mut self.stack) {
            if entry.open {
                tracing::debug!("Element {} closed by end of input", entry.node_id);
            }
            self.arena.push_top_level(entry.node_id)?;
        }

        let mut ignored_tokens = self.ignored;
        ignored_tokens.sort_by_key(|t| t.start);

        Ok(BuiltDocument {
            arena: self.arena,
            ignored_tokens,
        })
    }

    fn on_name(&mut self, token: Token<'a>) {
        let Some(tag) = self.tag.as_mut() else {
            self.ignore(token);
            return;
        };

        if tag.name.is_none() {
            tag.name = Some(token);
            return;
        }

        // A second name before any value: the previous one had no value
        let previous = tag.attr_name.replace(Token {
            kind: TokenKind::AttrName,
            ..token
        });
        tag.saw_equal = false;
        if let Some(previous) = previous {
            self.ignore(previous);
        }
    }

    fn on_value(&mut self, token: Token<'a>) {
        let bound = match self.tag.as_mut() {
            Some(tag) if tag.saw_equal => match tag.attr_name.take() {
                Some(name) => {
                    tag.attributes.push((name, token));
                    tag.saw_equal = false;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !bound {
            self.ignore(token);
        }
    }

    fn on_self_close(&mut self, token: Token<'a>) -> Result<()> {
        let tag = self.take_tag(&token)?;
        let element = self.open_element(&tag)?;
        self.stack.push(StackEntry {
            node_id: element,
            open: false,
        });
        Ok(())
    }

    fn on_tag_end(&mut self, token: Token<'a>) -> Result<()> {
        let tag = self.take_tag(&token)?;

        if !tag.closing {
            let element = self.open_element(&tag)?;
            self.stack.push(StackEntry {
                node_id: element,
                open: true,
            });
            return Ok(());
        }

        for (name, value) in &tag.attributes {
            self.ignored.push(*name);
            self.ignored.push(*value);
        }

        // `take_tag` guarantees the name
        let name = tag.name.map(|t| t.text).unwrap_or_default();
        self.close_element(name, &token)
    }

    /// Pop entries until the open element `name`; fold them in as children
    fn close_element(&mut self, name: &str, token: &Token<'a>) -> Result<()> {
        let mut collected = Vec::new();

        while let Some(entry) = self.stack.pop() {
            let node = self.arena.get(entry.node_id)?;
            if entry.open && node.tag_name() == Some(name) {
                for child_id in collected.into_iter().rev() {
                    self.arena.append_child(entry.node_id, child_id)?;
                }
                self.stack.push(StackEntry {
                    node_id: entry.node_id,
                    open: false,
                });
                return Ok(());
            }

            if entry.open {
                tracing::debug!(
                    "Unclosed <{}> folded into closing tag </{}> at {}:{}",
                    node.tag_name().unwrap_or_default(),
                    name,
                    token.line,
                    token.column
                );
            }
            collected.push(entry.node_id);
        }

        Err(ConversionError::structural(
            format!(
                "Tag name of closing tag \"{}\" at {}:{} doesn't match to any opening tag.",
                name, token.line, token.column
            ),
            Some(token.position()),
        ))
    }

    /// Close the current tag context, requiring a captured tag name
    fn take_tag(&mut self, token: &Token<'a>) -> Result<TagContext<'a>> {
        let mut tag = self
            .tag
            .take()
            .unwrap_or_else(|| TagContext::new(token.position()));

        if let Some(dangling) = tag.attr_name.take() {
            self.ignore(dangling);
        }

        if tag.name.is_none() {
            return Err(ConversionError::structural(
                format!("Missing tag name at {}", tag.start),
                Some(tag.start),
            ));
        }
        Ok(tag)
    }

    /// Allocate an element with its attributes as first children
    fn open_element(&mut self, tag: &TagContext<'a>) -> Result<NodeId> {
        let name = tag.name.map(|t| t.text).unwrap_or_default();
        let element = self.arena.add_node(NodeKind::Element {
            name: name.to_string(),
        });

        for (attr_name, attr_value) in &tag.attributes {
            let attribute = self.arena.add_node(NodeKind::Attribute {
                name: attr_name.text.to_string(),
                value: strip_quotes(attr_value.text).to_string(),
            });
            self.arena.append_child(element, attribute)?;
        }

        Ok(element)
    }

    fn push_node(&mut self, kind: NodeKind) {
        let node_id = self.arena.add_node(kind);
        self.stack.push(StackEntry {
            node_id,
            open: false,
        });
    }

    fn flush_text(&mut self) {
        let run = std::mem::take(&mut self.text.content);
        let trimmed = run.trim();
        if !trimmed.is_empty() {
            self.push_node(NodeKind::Text(trimmed.to_string()));
        }
    }

    fn ignore(&mut self, token: Token<'a>) {
        tracing::debug!(
            "Ignoring {} token {:?} at {}:{}",
            token.kind,
            token.text,
            token.line,
            token.column
        );
        self.ignored.push(token);
    }
}

/// Drop the surrounding quote characters of an attribute value
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(doc: &BuiltDocument<'_>, parent: NodeId) -> Vec<String> {
        doc.arena
            .children(parent)
            .unwrap()
            .iter()
            .map(|n| n.kind.key())
            .collect()
    }

    fn structural_message(input: &str) -> String {
        match TreeBuilder::parse(input).unwrap_err() {
            ConversionError::Structural { message, .. } => message,
            other => panic!("Expected structural error, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_document() {
        let doc = TreeBuilder::parse("<a/>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(doc.arena.get(root).unwrap().tag_name(), Some("a"));
        assert!(doc.arena.children(root).unwrap().is_empty());
        assert!(doc.ignored_tokens.is_empty());
    }

    #[test]
    fn test_attributes_precede_children() {
        let doc = TreeBuilder::parse(r#"<a x="1" y='two'><b/>text</a>"#).unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["@x", "@y", "b", "#TEXT"]);
        assert_eq!(doc.arena.attr(root, "y"), Some("two"));
    }

    #[test]
    fn test_nested_same_name_elements() {
        let doc = TreeBuilder::parse("<a><a><a/></a></a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        let inner = doc.arena.get(root).unwrap().children_ids[0];
        assert_eq!(element_names(&doc, root), vec!["a"]);
        assert_eq!(element_names(&doc, inner), vec!["a"]);
    }

    #[test]
    fn test_text_is_trimmed_and_entities_pass_through() {
        let doc = TreeBuilder::parse("<a>\n  Fish &amp; Chips \n</a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(doc.arena.text_content(root).unwrap(), "Fish &amp; Chips");
    }

    #[test]
    fn test_whitespace_text_is_dropped() {
        let doc = TreeBuilder::parse("<a>\n   <b/>\n\t</a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["b"]);
    }

    #[test]
    fn test_cdata_kept_verbatim() {
        let doc = TreeBuilder::parse("<a> <![CDATA[ <raw> ]]> </a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(
            doc.arena.text_content(root).unwrap(),
            "<![CDATA[ <raw> ]]>"
        );
    }

    #[test]
    fn test_comments_and_pis_are_not_roots() {
        let doc = TreeBuilder::parse(
            "<?xml version=\"1.0\"?>\n<!-- head --><a><!-- inner --></a><!--tail-->",
        )
        .unwrap();

        let keys: Vec<_> = doc
            .arena
            .top_level()
            .iter()
            .map(|&id| doc.arena.get(id).unwrap().kind.clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                NodeKind::ProcInstr("<?xml version=\"1.0\"?>".to_string()),
                NodeKind::Comment(" head ".to_string()),
                NodeKind::Element {
                    name: "a".to_string()
                },
                NodeKind::Comment("tail".to_string()),
            ]
        );
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["#COMMENT"]);
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let message = structural_message("<a><b>ABCD</a></b>");
        assert!(message.contains("\"b\""), "{message}");
        assert!(message.contains("doesn't match"), "{message}");
    }

    #[test]
    fn test_two_roots() {
        let message = structural_message("<a></a><b>ABCD</b>");
        assert_eq!(
            message,
            "The root must have exactly ONE tag. Check for \"a, b\" tags."
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        for input in ["", "   \n\t  ", "<!-- only a comment -->"] {
            let message = structural_message(input);
            assert!(message.starts_with("The root must have exactly ONE tag"));
        }
    }

    #[test]
    fn test_top_level_text_counts_as_root() {
        let message = structural_message("stray <a/>");
        assert!(message.contains("stray, a"), "{message}");
    }

    #[test]
    fn test_missing_tag_name() {
        for input in ["<>", "</>", "< />", "<a></>"] {
            let err = TreeBuilder::parse(input).unwrap_err();
            assert!(err.is_structural(), "{input}: {err:?}");
            assert!(err.to_string().starts_with("Missing tag name"));
        }
    }

    #[test]
    fn test_missing_name_reports_tag_start() {
        let err = TreeBuilder::parse("<a>\n  <></a>").unwrap_err();
        let position = err.position().unwrap();
        assert_eq!((position.line, position.column), (2, 3));
    }

    #[test]
    fn test_unclosed_intermediate_frame_is_folded() {
        // `b` never closes: it becomes an empty child of `a`, text stays in `a`
        let doc = TreeBuilder::parse("<a><b>text</a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["b", "#TEXT"]);
        let b = doc.arena.get(root).unwrap().children_ids[0];
        assert!(doc.arena.children(b).unwrap().is_empty());
    }

    #[test]
    fn test_missing_opening_angle_bracket() {
        // Without its `<` the tag is plain text and `</b>` has nothing to match
        let doc = TreeBuilder::parse("<a>b>hello</b></a>");
        assert!(doc.unwrap_err().is_structural());

        // A stray tag tail becomes a text sibling
        let doc = TreeBuilder::parse("<a><b>x</b>c/></a>").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["b", "#TEXT"]);
    }

    #[test]
    fn test_unclosed_root_at_end_of_input() {
        let doc = TreeBuilder::parse("<a x=\"1\">").unwrap();
        let root = doc.arena.root_element().unwrap();
        assert_eq!(element_names(&doc, root), vec!["@x"]);
    }

    #[test]
    fn test_ignored_tokens() {
        let doc =
            TreeBuilder::parse("<!DOCTYPE a><a checked x=\"1\" =\"2\"></a x=\"3\">").unwrap();

        let ignored: Vec<_> = doc
            .ignored_tokens
            .iter()
            .map(|t| (t.kind, t.text))
            .collect();
        assert_eq!(
            ignored,
            vec![
                (TokenKind::Doctype, "<!DOCTYPE a>"),
                (TokenKind::AttrName, "checked"),
                (TokenKind::Equal, "="),
                (TokenKind::AttrValueDouble, "\"2\""),
                (TokenKind::AttrName, "x"),
                (TokenKind::AttrValueDouble, "\"3\""),
            ]
        );

        let root = doc.arena.root_element().unwrap();
        assert_eq!(doc.arena.attr(root, "x"), Some("1"));
    }

    #[test]
    fn test_lexical_error_propagates() {
        let err = TreeBuilder::parse("<a>\n<b !/></a>").unwrap_err();
        match err {
            ConversionError::Lexical { line, column, ch, .. } => {
                assert_eq!((line, column, ch), (2, 4, '!'));
            }
            other => panic!("Expected lexical error, got {other:?}"),
        }
    }
}
