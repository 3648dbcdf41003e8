//! In-memory real filesystem.
//!
//! Stands in for the host in tests and anywhere an export should not touch
//! disk. All data is ephemeral.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use super::RealFs;
use crate::types::{DirEntry, FileAttr};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, attr: FileAttr },
    Directory { attr: FileAttr },
}

impl Entry {
    fn attr(&self) -> &FileAttr {
        match self {
            Entry::File { attr, .. } => attr,
            Entry::Directory { attr } => attr,
        }
    }

    fn attr_mut(&mut self) -> &mut FileAttr {
        match self {
            Entry::File { attr, .. } => attr,
            Entry::Directory { attr } => attr,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }
}

/// Largest file the memory filesystem will hold.
const MAX_FILE_SIZE: usize = 1 << 32;

fn err(kind: io::ErrorKind, path: &Path) -> io::Error {
    io::Error::new(kind, path.display().to_string())
}

/// Byte length `len` as an in-memory size, or `FileTooLarge`.
fn checked_len(len: Option<u64>, path: &Path) -> io::Result<usize> {
    len.and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n <= MAX_FILE_SIZE)
        .ok_or_else(|| err(io::ErrorKind::FileTooLarge, path))
}

/// In-memory [`RealFs`].
///
/// Thread-safe via an internal `RwLock`. Entries are keyed by absolute
/// path; `/` always exists. Every primitive call is counted.
#[derive(Debug)]
pub struct MemoryFs {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
    ops: AtomicUsize,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a filesystem holding only `/`.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            PathBuf::from("/"),
            Entry::Directory {
                attr: FileAttr::directory(0o755),
            },
        );
        Self {
            entries: RwLock::new(entries),
            ops: AtomicUsize::new(0),
        }
    }

    /// Add a directory and any missing ancestors.
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        {
            let mut entries = self.entries.write();
            for ancestor in path.as_ref().ancestors() {
                entries
                    .entry(ancestor.to_path_buf())
                    .or_insert_with(|| Entry::Directory {
                        attr: FileAttr::directory(0o755),
                    });
            }
        }
        self
    }

    /// Number of primitive calls served so far.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::Relaxed)
    }

    fn count(&self) {
        self.ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Fail unless the parent of `path` is an existing directory.
    fn check_parent(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> io::Result<()> {
        let Some(parent) = path.parent() else {
            return Err(err(io::ErrorKind::AlreadyExists, path));
        };
        match entries.get(parent) {
            Some(entry) if entry.is_dir() => Ok(()),
            Some(_) => Err(err(io::ErrorKind::NotADirectory, parent)),
            None => Err(err(io::ErrorKind::NotFound, parent)),
        }
    }

    fn has_children(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> bool {
        entries.keys().any(|k| k.parent() == Some(path))
    }
}

impl RealFs for MemoryFs {
    fn read_at(&self, path: &Path, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.count();
        let entries = self.entries.read();
        match entries.get(path) {
            Some(Entry::File { data, .. }) => {
                let start = usize::try_from(offset).map_or(data.len(), |o| o.min(data.len()));
                let n = buf.len().min(data.len() - start);
                buf[..n].copy_from_slice(&data[start..start + n]);
                Ok(n)
            }
            Some(Entry::Directory { .. }) => Err(err(io::ErrorKind::IsADirectory, path)),
            None => Err(err(io::ErrorKind::NotFound, path)),
        }
    }

    fn write_at(&self, path: &Path, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.count();
        let mut entries = self.entries.write();
        match entries.get_mut(path) {
            Some(Entry::File { data, attr }) => {
                let end = checked_len(offset.checked_add(buf.len() as u64), path)?;
                let start = end - buf.len();
                if data.len() < end {
                    data.resize(end, 0);
                }
                data[start..end].copy_from_slice(buf);
                attr.size = data.len() as u64;
                attr.mtime = SystemTime::now();
                Ok(buf.len())
            }
            Some(Entry::Directory { .. }) => Err(err(io::ErrorKind::IsADirectory, path)),
            None => Err(err(io::ErrorKind::NotFound, path)),
        }
    }

    fn create(&self, path: &Path) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        if entries.get(path).is_some_and(Entry::is_dir) {
            return Err(err(io::ErrorKind::IsADirectory, path));
        }
        Self::check_parent(&entries, path)?;
        entries.insert(
            path.to_path_buf(),
            Entry::File {
                data: Vec::new(),
                attr: FileAttr::file(0, 0o644),
            },
        );
        Ok(())
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        if entries.contains_key(path) {
            return Err(err(io::ErrorKind::AlreadyExists, path));
        }
        Self::check_parent(&entries, path)?;
        entries.insert(
            path.to_path_buf(),
            Entry::Directory {
                attr: FileAttr::directory(0o755),
            },
        );
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        let from_is_dir = match entries.get(from) {
            Some(entry) => entry.is_dir(),
            None => return Err(err(io::ErrorKind::NotFound, from)),
        };
        if from == to {
            return Ok(());
        }
        if from_is_dir && to.starts_with(from) {
            return Err(err(io::ErrorKind::InvalidInput, to));
        }
        Self::check_parent(&entries, to)?;

        if let Some(to_is_dir) = entries.get(to).map(Entry::is_dir) {
            match (from_is_dir, to_is_dir) {
                (false, true) => return Err(err(io::ErrorKind::IsADirectory, to)),
                (true, false) => return Err(err(io::ErrorKind::NotADirectory, to)),
                (true, true) if Self::has_children(&entries, to) => {
                    return Err(err(io::ErrorKind::DirectoryNotEmpty, to));
                }
                _ => {}
            }
            entries.remove(to);
        }

        let moved: Vec<PathBuf> = entries
            .keys()
            .filter(|k| k.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = entries.remove(&old) {
                let new = match old.strip_prefix(from) {
                    Ok(rest) if !rest.as_os_str().is_empty() => to.join(rest),
                    _ => to.to_path_buf(),
                };
                entries.insert(new, entry);
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        let is_dir = entries
            .get(path)
            .map(Entry::is_dir)
            .ok_or_else(|| err(io::ErrorKind::NotFound, path))?;
        if is_dir && Self::has_children(&entries, path) {
            return Err(err(io::ErrorKind::DirectoryNotEmpty, path));
        }
        entries.remove(path);
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        entries.retain(|k, _| !k.starts_with(path) || k.parent().is_none());
        Ok(())
    }

    fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.count();
        let entries = self.entries.read();
        match entries.get(path) {
            Some(entry) if entry.is_dir() => {}
            Some(_) => return Err(err(io::ErrorKind::NotADirectory, path)),
            None => return Err(err(io::ErrorKind::NotFound, path)),
        }
        // BTreeMap order keeps the listing sorted by name.
        Ok(entries
            .iter()
            .filter(|(k, _)| k.parent() == Some(path))
            .filter_map(|(k, entry)| {
                Some(DirEntry::new(k.file_name()?, entry.attr().clone()))
            })
            .collect())
    }

    fn stat(&self, path: &Path) -> io::Result<FileAttr> {
        self.count();
        self.entries
            .read()
            .get(path)
            .map(|e| e.attr().clone())
            .ok_or_else(|| err(io::ErrorKind::NotFound, path))
    }

    fn truncate(&self, path: &Path, size: u64) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        match entries.get_mut(path) {
            Some(Entry::File { data, attr }) => {
                data.resize(checked_len(Some(size), path)?, 0);
                attr.size = size;
                attr.mtime = SystemTime::now();
                Ok(())
            }
            Some(Entry::Directory { .. }) => Err(err(io::ErrorKind::IsADirectory, path)),
            None => Err(err(io::ErrorKind::NotFound, path)),
        }
    }

    fn set_times(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        self.count();
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(path)
            .ok_or_else(|| err(io::ErrorKind::NotFound, path))?;
        let attr = entry.attr_mut();
        attr.atime = Some(atime);
        attr.mtime = mtime;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    #[test]
    fn test_with_dir_creates_ancestors() {
        let fs = MemoryFs::new().with_dir("/srv/export");
        assert!(fs.stat(p("/srv")).unwrap().is_dir());
        assert!(fs.stat(p("/srv/export")).unwrap().is_dir());
    }

    #[test]
    fn test_create_needs_parent() {
        let fs = MemoryFs::new();
        let e = fs.create(p("/missing/f")).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);

        fs.create(p("/f")).unwrap();
        let e = fs.create(p("/f/g")).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::NotADirectory);
    }

    #[test]
    fn test_write_extends_with_zeros() {
        let fs = MemoryFs::new();
        fs.create(p("/f")).unwrap();
        fs.write_at(p("/f"), b"xy", 3).unwrap();

        let mut buf = [0xffu8; 8];
        assert_eq!(fs.read_at(p("/f"), &mut buf, 0).unwrap(), 5);
        assert_eq!(&buf[..5], b"\0\0\0xy");
        assert_eq!(fs.stat(p("/f")).unwrap().size, 5);
    }

    #[test]
    fn test_huge_offset_or_size_rejected() {
        let fs = MemoryFs::new();
        fs.create(p("/f")).unwrap();
        fs.write_at(p("/f"), b"abc", 0).unwrap();

        let e = fs.write_at(p("/f"), b"x", u64::MAX).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::FileTooLarge);
        let e = fs.truncate(p("/f"), u64::MAX).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::FileTooLarge);

        // Untouched.
        assert_eq!(fs.stat(p("/f")).unwrap().size, 3);
        let mut buf = [0u8; 1];
        assert_eq!(fs.read_at(p("/f"), &mut buf, u64::MAX).unwrap(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let fs = MemoryFs::new();
        fs.create(p("/f")).unwrap();
        fs.write_at(p("/f"), b"abc", 0).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(fs.read_at(p("/f"), &mut buf, 10).unwrap(), 0);
    }

    #[test]
    fn test_mkdir_exists() {
        let fs = MemoryFs::new();
        fs.mkdir(p("/d")).unwrap();
        let e = fs.mkdir(p("/d")).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_rename_moves_subtree() {
        let fs = MemoryFs::new();
        fs.mkdir(p("/a")).unwrap();
        fs.mkdir(p("/a/b")).unwrap();
        fs.create(p("/a/b/f")).unwrap();

        fs.rename(p("/a"), p("/z")).unwrap();
        assert!(fs.stat(p("/a/b/f")).is_err());
        assert!(fs.stat(p("/z/b/f")).unwrap().is_file());
    }

    #[test]
    fn test_rename_into_self_rejected() {
        let fs = MemoryFs::new();
        fs.mkdir(p("/a")).unwrap();
        let e = fs.rename(p("/a"), p("/a/b")).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rename_replaces_file() {
        let fs = MemoryFs::new();
        fs.create(p("/a")).unwrap();
        fs.write_at(p("/a"), b"new", 0).unwrap();
        fs.create(p("/b")).unwrap();

        fs.rename(p("/a"), p("/b")).unwrap();
        assert_eq!(fs.stat(p("/b")).unwrap().size, 3);
    }

    #[test]
    fn test_remove_semantics() {
        let fs = MemoryFs::new();
        fs.mkdir(p("/d")).unwrap();
        fs.create(p("/d/f")).unwrap();

        let e = fs.remove(p("/d")).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::DirectoryNotEmpty);

        fs.remove_all(p("/d")).unwrap();
        assert!(fs.stat(p("/d/f")).is_err());
        assert!(fs.stat(p("/d")).is_err());
        fs.remove_all(p("/d")).unwrap();
    }

    #[test]
    fn test_list_only_direct_children() {
        let fs = MemoryFs::new();
        fs.mkdir(p("/d")).unwrap();
        fs.create(p("/d/b")).unwrap();
        fs.mkdir(p("/d/a")).unwrap();
        fs.create(p("/d/a/deep")).unwrap();

        let names: Vec<_> = fs
            .list(p("/d"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_op_count() {
        let fs = MemoryFs::new();
        assert_eq!(fs.op_count(), 0);
        let _ = fs.stat(p("/"));
        let _ = fs.stat(p("/nope"));
        assert_eq!(fs.op_count(), 2);
    }
}
