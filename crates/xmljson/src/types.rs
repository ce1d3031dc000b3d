//! Core type definitions shared by the scanner, the tree builder and the
//! serializer.
//!
//! Key design principles:
//! 1. Use u32 for node indices (4 bytes vs 8 bytes pointer)
//! 2. Tokens borrow their text from the input buffer
//! 3. Use SmallVec for child lists (most elements have few children)
//! 4. Node kinds are an explicit enum; the `@`/`#TEXT` sigils only exist in
//!    the JSON codec

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Node identifier (index into arena)
pub type NodeId = u32;

/// Token kind produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // DATA mode
    ProcInstr,
    Comment,
    CData,
    Doctype,
    LessThan,
    Entity,
    Text,

    // TAG mode
    Whitespace,
    TagName,
    AttrName,
    Equal,
    AttrValueDouble,
    AttrValueSingle,
    SlashGreaterThan,
    Slash,
    GreaterThan,
    Punct,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::ProcInstr => "PROC_INSTR",
            TokenKind::Comment => "COMMENT",
            TokenKind::CData => "CDATA",
            TokenKind::Doctype => "DOCTYPE",
            TokenKind::LessThan => "LT",
            TokenKind::Entity => "ENTITY",
            TokenKind::Text => "TEXT",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::TagName => "TAG_NAME",
            TokenKind::AttrName => "ATTR_NAME",
            TokenKind::Equal => "EQUAL",
            TokenKind::AttrValueDouble => "ATTR_VALUE_DQ",
            TokenKind::AttrValueSingle => "ATTR_VALUE_SQ",
            TokenKind::SlashGreaterThan => "SLASH_GT",
            TokenKind::Slash => "SLASH",
            TokenKind::GreaterThan => "GT",
            TokenKind::Punct => "PUNCT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source position of a token (1-based line/column, byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A scanned token. `text` is the exact matched slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    /// Exclusive
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl<'a> Token<'a> {
    pub fn position(&self) -> Position {
        Position {
            offset: self.start,
            line: self.line,
            column: self.column,
        }
    }
}

/// Document node payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element { name: String },
    Attribute { name: String, value: String },
    Text(String),
    Comment(String),
    ProcInstr(String),
}

impl NodeKind {
    /// Key of this node inside its sibling group (tag name or sigil key)
    pub fn key(&self) -> String {
        match self {
            NodeKind::Element { name } => name.clone(),
            NodeKind::Attribute { name, .. } => format!("{}{}", ATTRIBUTE_PREFIX, name),
            NodeKind::Text(_) => TEXT_KEY.to_string(),
            NodeKind::Comment(_) => COMMENT_KEY.to_string(),
            NodeKind::ProcInstr(_) => PROC_INSTR_KEY.to_string(),
        }
    }
}

/// A node stored in the document arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlNode {
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub kind: NodeKind,
    pub children_ids: SmallVec<[NodeId; 4]>,
}

impl XmlNode {
    pub fn new(node_id: NodeId, kind: NodeKind) -> Self {
        Self {
            node_id,
            parent_id: None,
            kind,
            children_ids: SmallVec::new(),
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, NodeKind::Attribute { .. })
    }

    /// Comments and processing instructions never count as a root
    pub fn is_misc(&self) -> bool {
        matches!(self.kind, NodeKind::Comment(_) | NodeKind::ProcInstr(_))
    }
}

/// Sigil prefix for attribute keys in the JSON encoding
pub const ATTRIBUTE_PREFIX: &str = "@";

/// Sigil key for text runs
pub const TEXT_KEY: &str = "#TEXT";

/// Sigil key for comments
pub const COMMENT_KEY: &str = "#COMMENT";

/// Sigil key for processing instructions
pub const PROC_INSTR_KEY: &str = "#PROC_INSTR";
