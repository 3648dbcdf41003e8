//! Metadata records returned by stat and directory listing.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::Metadata;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else (fifo, socket, device).
    Other,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }
}

impl From<std::fs::FileType> for FileType {
    fn from(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_file() {
            FileType::File
        } else {
            FileType::Other
        }
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes, as recorded in metadata.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o644).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time (optional).
    pub atime: Option<SystemTime>,
    /// Last status change time (optional).
    pub ctime: Option<SystemTime>,
    /// Number of hard links.
    pub nlink: u32,
    /// User ID (optional, for host fs).
    pub uid: Option<u32>,
    /// Group ID (optional, for host fs).
    pub gid: Option<u32>,
}

impl FileAttr {
    /// Create attributes for a new file.
    pub fn file(size: u64, perm: u32) -> Self {
        let now = SystemTime::now();
        Self {
            size,
            kind: FileType::File,
            perm,
            mtime: now,
            atime: Some(now),
            ctime: Some(now),
            nlink: 1,
            uid: None,
            gid: None,
        }
    }

    /// Create attributes for a new directory.
    pub fn directory(perm: u32) -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            nlink: 2,
            ..Self::file(0, perm)
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

impl From<&Metadata> for FileAttr {
    fn from(meta: &Metadata) -> Self {
        FileAttr {
            size: meta.len(),
            kind: meta.file_type().into(),
            perm: meta.permissions().mode() & 0o7777,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            atime: meta.accessed().ok(),
            ctime: unix_time(meta.ctime(), meta.ctime_nsec()),
            nlink: meta.nlink() as u32,
            uid: Some(meta.uid()),
            gid: Some(meta.gid()),
        }
    }
}

/// Seconds and nanoseconds relative to the Unix epoch.
fn unix_time(secs: i64, nsecs: i64) -> Option<SystemTime> {
    let nsecs = u32::try_from(nsecs).ok()?;
    if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::new(secs.unsigned_abs(), nsecs))
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(secs.unsigned_abs()))?
            .checked_add(Duration::from_nanos(nsecs.into()))
    }
}

/// Directory entry with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path), exactly as the host returned it.
    pub name: OsString,
    /// Entry metadata, not following symlinks.
    pub attr: FileAttr,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<OsString>, attr: FileAttr) -> Self {
        Self {
            name: name.into(),
            attr,
        }
    }

    /// Entry type.
    pub fn kind(&self) -> FileType {
        self.attr.kind
    }
}
