//! File-level errors
//!
//! Wraps the core conversion error with the I/O and JSON failures that only
//! exist once documents live on disk.

use std::path::PathBuf;
use thiserror::Error;
use xmljson::ConversionError;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl FileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the failure came from the document itself, not from the disk
    pub fn is_conversion(&self) -> bool {
        matches!(self, FileError::Conversion(_) | FileError::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, FileError>;
