//! Error types for annotation reads and writes.

use std::path::PathBuf;
use thiserror::Error;

use crate::comment::Field;

/// Top-level error type for annexif operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The image could not be opened, read, parsed or written.
    #[error("Unable to access image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The UserComment tag is missing, or does not carry the requested field.
    #[error("{field} not found in exif data: {reason}")]
    NotFound { field: Field, reason: String },

    /// A field value that cannot be stored in the comment.
    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidValue {
        field: Field,
        value: String,
        reason: &'static str,
    },

    /// No write strategy exists for this file type.
    #[error("Unsupported format for {0}")]
    UnsupportedFormat(PathBuf),
}

impl Error {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_found(field: Field, reason: impl Into<String>) -> Self {
        Self::NotFound {
            field,
            reason: reason.into(),
        }
    }

    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// `true` for [`Error::Io`].
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Convenience type alias for annexif results.
pub type Result<T> = std::result::Result<T, Error>;
