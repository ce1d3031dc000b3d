//! Error types for conversions
//!
//! Two fatal kinds from the forward pass (lexical, structural), one from the
//! reverse pass. No recovery, no partial results.

use crate::types::Position;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    /// No scanner rule matched at the current offset
    #[error("Unexpected token at {line}:{column} ({ch:?})")]
    Lexical {
        offset: usize,
        line: usize,
        column: usize,
        ch: char,
    },

    /// Malformed nesting, missing tag name or wrong root count
    #[error("{message}")]
    Structural {
        message: String,
        position: Option<Position>,
    },

    /// JSON value that cannot be rendered as a document
    #[error("Invalid document shape: {0}")]
    InvalidShape(String),

    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConversionError {
    pub(crate) fn structural(message: impl Into<String>, position: Option<Position>) -> Self {
        ConversionError::Structural {
            message: message.into(),
            position,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, ConversionError::Lexical { .. })
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, ConversionError::Structural { .. })
    }

    /// Source position, when the error carries one
    pub fn position(&self) -> Option<Position> {
        match self {
            ConversionError::Lexical {
                offset,
                line,
                column,
                ..
            } => Some(Position {
                offset: *offset,
                line: *line,
                column: *column,
            }),
            ConversionError::Structural { position, .. } => *position,
            _ => None,
        }
    }
}
