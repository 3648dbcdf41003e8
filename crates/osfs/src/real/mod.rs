//! Real filesystems.
//!
//! A [`RealFs`] is the host-side collaborator the adapter delegates to
//! once a path has been translated. Every method takes a real path and
//! reports failures as plain `io::Error`s.

mod host;
mod memory;

use std::fmt;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::types::{DirEntry, FileAttr};

pub use host::HostFs;
pub use memory::MemoryFs;

/// Primitive operations on real paths.
pub trait RealFs: Send + Sync + fmt::Debug {
    /// Open for reading and read into `buf` at `offset`.
    fn read_at(&self, path: &Path, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Open an existing file for read-write and write `buf` at `offset`.
    fn write_at(&self, path: &Path, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Create or truncate a file.
    fn create(&self, path: &Path) -> io::Result<()>;

    /// Create one directory.
    fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Rename an entry.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file or an empty directory.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Remove an entry and everything beneath it. Absent is not an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;

    /// List a directory, sorted by name.
    fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Metadata, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileAttr>;

    /// Truncate or extend a file.
    fn truncate(&self, path: &Path, size: u64) -> io::Result<()>;

    /// Set access and modification times.
    fn set_times(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()>;
}
