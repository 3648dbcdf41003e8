//! Capability-set trait.
//!
//! The operations every virtual filesystem offers its clients. Paths are
//! virtual: rooted at `/` and independent of any real layout.

use std::path::Path;

use crate::attr::{AttrName, AttrValue};
use crate::error::FsResult;
use crate::types::{DirEntry, FileAttr};

/// Core filesystem operations.
///
/// Implementations must be safe to call from several threads at once.
/// Coordination of concurrent access to the same file is left to whatever
/// sits underneath.
pub trait FileSystem: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Read into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes read, fewer than `buf.len()` only at
    /// end of file.
    fn read_file(&self, path: &Path, buf: &mut [u8], offset: u64) -> FsResult<usize>;

    /// List a directory.
    ///
    /// Returns all entries in one call (no pagination).
    fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>>;

    /// Get the full metadata record.
    fn stat(&self, path: &Path) -> FsResult<FileAttr>;

    /// Get one attribute.
    fn get_attribute(&self, path: &Path, name: AttrName) -> FsResult<AttrValue>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `buf` at `offset` into an existing file.
    ///
    /// Returns the number of bytes written.
    fn write_file(&self, path: &Path, buf: &[u8], offset: u64) -> FsResult<usize>;

    /// Create an empty file, truncating any existing one.
    fn create_file(&self, path: &Path) -> FsResult<()>;

    /// Create a directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> FsResult<()>;

    /// Move a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> FsResult<()>;

    /// Remove a file or directory.
    ///
    /// Without `recursive` a directory must be empty.
    fn remove(&self, path: &Path, recursive: bool) -> FsResult<()>;

    /// Set one attribute.
    fn set_attribute(&self, path: &Path, value: AttrValue) -> FsResult<()>;

    // ========================================================================
    // Identity
    // ========================================================================

    /// Human-readable identifier naming what this filesystem exports.
    fn describe(&self) -> String;
}
