//! Adapter error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::attr::AttrName;

/// Adapter error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// The root could not be used when building an adapter.
    #[error("cannot export {}: {source}", root.display())]
    Construction {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A real filesystem primitive failed.
    ///
    /// `path` is the virtual path the caller supplied.
    #[error("{op} {}: {source}", path.display())]
    Delegation {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Attribute name outside the recognized set.
    #[error("unsupported attribute: {0}")]
    UnsupportedAttribute(String),

    /// Attribute value of the wrong kind for the named attribute.
    #[error("invalid value for attribute {name}: expected {expected}, got {found}")]
    InvalidAttributeValue {
        name: AttrName,
        expected: &'static str,
        found: &'static str,
    },

    /// Metadata for an attribute read could not be obtained.
    #[error("reading attribute of {} (translated as {}): {source}", path.display(), real_path.display())]
    AttributeRead {
        path: PathBuf,
        real_path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Create a Construction error.
    pub fn construction(root: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Construction {
            root: root.into(),
            source,
        }
    }

    /// Create a Delegation error.
    pub fn delegation(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Delegation {
            op,
            path: path.into(),
            source,
        }
    }

    /// Create an UnsupportedAttribute error.
    pub fn unsupported_attribute(name: impl Into<String>) -> Self {
        Self::UnsupportedAttribute(name.into())
    }

    /// The closest `io::ErrorKind` for this error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            FsError::Construction { source, .. }
            | FsError::Delegation { source, .. }
            | FsError::AttributeRead { source, .. } => source.kind(),
            FsError::UnsupportedAttribute(_) => io::ErrorKind::Unsupported,
            FsError::InvalidAttributeValue { .. } => io::ErrorKind::InvalidInput,
        }
    }

    /// Returns true if the underlying cause is a missing entry.
    pub fn is_not_found(&self) -> bool {
        self.kind() == io::ErrorKind::NotFound
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::Delegation { source, .. } => source,
            other => io::Error::new(other.kind(), other),
        }
    }
}

/// Adapter result type.
pub type FsResult<T> = Result<T, FsError>;
