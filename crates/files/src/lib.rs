//! File-level XML ⇄ JSON conversion
//!
//! Async collaborator around the synchronous `xmljson` core: documents are
//! loaded from a [`TextStore`], converted, and written back. Independent
//! conversions run concurrently.
//!
//! ```text
//! TextStore ──load──▶ ConversionService ──store──▶ TextStore
//!                           │
//!                           └──▶ EventBus (Started / Completed / Failed)
//! ```

pub mod converter;
pub mod error;
pub mod events;
pub mod store;

pub use converter::{ConversionJob, ConverterConfig, Direction, FileConverter, JobOutcome};
pub use error::{FileError, Result};
pub use events::{ConversionEvent, EventBus};
pub use store::{FsStore, MemoryStore, TextStore};
