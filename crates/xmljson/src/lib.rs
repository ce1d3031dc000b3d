//! XML ⇄ JSON conversion library
//!
//! Lossless-structure conversion between XML text and a JSON representation
//! built from single-key entries.
//!
//! ## Design
//!
//! - **Data first**: one arena of tagged nodes, sigil keys only at the JSON boundary
//! - **Borrowed tokens**: the scanner hands out slices of the input, no copies
//! - **Bounded depth**: scanner, builder, codec and serializer run on explicit
//!   stacks; the JSON form (and the compactor that recurses over it) is capped
//!   at [`json::MAX_DEPTH`] nested elements
//!
//! ## Core Design
//!
//! ```text
//! XML text → Scanner → Token<'a> → TreeBuilder → DocumentArena → json::encode → compact? → Value
//!                                                      ↑
//! XML text ←──── XmlSerializer ←───────────────────────┴──── json::decode ← Value (array or compact)
//! ```

pub mod arena;
pub mod builder;
pub mod compact;
pub mod error;
pub mod json;
pub mod scanner;
pub mod serializer;
pub mod service;
pub mod types;
pub mod utils;

pub use arena::DocumentArena;
pub use builder::{BuiltDocument, TreeBuilder};
pub use error::{ConversionError, Result};
pub use scanner::Scanner;
pub use serializer::{SerializerConfig, XmlSerializer};
pub use service::{
    parse_document, render_document, ConversionService, ConvertOptions, ParsedDocument,
};
pub use types::*;
