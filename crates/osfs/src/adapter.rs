//! The adapter: a [`FileSystem`] confined to one real directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::attr::{AttrName, AttrValue};
use crate::config::OsFsConfig;
use crate::error::{FsError, FsResult};
use crate::ops::FileSystem;
use crate::path::translate;
use crate::real::{HostFs, RealFs};
use crate::types::{DirEntry, FileAttr};

/// Filesystem adapter rooted at a real directory.
///
/// Every operation translates its virtual path(s) onto `root` and makes
/// exactly one call into the [`RealFs`]. For example, with a root of
/// `/export`, `read_file("/a/b.txt", ..)` reads `/export/a/b.txt` and
/// `read_file("/../../etc/passwd", ..)` reads `/export/etc/passwd`.
///
/// The root is validated once, at construction, and never changes.
#[derive(Debug, Clone)]
pub struct OsFs<R: RealFs = HostFs> {
    root: PathBuf,
    real: R,
}

impl OsFs<HostFs> {
    /// Export a host directory.
    ///
    /// The root is made absolute (resolving symlinks) and must be a
    /// directory.
    pub fn new(root: impl AsRef<Path>) -> FsResult<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| FsError::construction(root, e))?;
        Self::with_real(root, HostFs::new())
    }

    /// Export the directory named by a configuration.
    pub fn from_config(config: &OsFsConfig) -> FsResult<Self> {
        Self::new(config.root())
    }
}

impl<R: RealFs> OsFs<R> {
    /// Export `root` from an arbitrary real filesystem.
    ///
    /// `root` is used as given; it must be absolute and stat as a directory.
    pub fn with_real(root: impl Into<PathBuf>, real: R) -> FsResult<Self> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(FsError::construction(
                &root,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "root is not absolute"),
            ));
        }
        let attr = real
            .stat(&root)
            .map_err(|e| FsError::construction(&root, e))?;
        if !attr.is_dir() {
            return Err(FsError::construction(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "root is not a directory"),
            ));
        }
        tracing::debug!(root = %root.display(), "exporting");
        Ok(Self { root, real })
    }

    /// The exported root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The real filesystem underneath.
    pub fn real(&self) -> &R {
        &self.real
    }

    /// Real path a virtual path resolves to.
    pub fn real_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let real = translate(&self.root, path.as_ref());
        tracing::trace!(real = %real.display(), "translated");
        real
    }

    /// Run one delegated primitive against the translated path.
    fn delegate<T>(
        &self,
        op: &'static str,
        path: &Path,
        f: impl FnOnce(&R, &Path) -> std::io::Result<T>,
    ) -> FsResult<T> {
        let real = self.real_path(path);
        f(&self.real, &real).map_err(|e| FsError::delegation(op, path, e))
    }
}

impl<R: RealFs> FileSystem for OsFs<R> {
    #[tracing::instrument(level = "debug", skip(self, buf), fields(path = %path.display(), len = buf.len()))]
    fn read_file(&self, path: &Path, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        self.delegate("read", path, |fs, real| fs.read_at(real, buf, offset))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        self.delegate("readdir", path, |fs, real| fs.list(real))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn stat(&self, path: &Path) -> FsResult<FileAttr> {
        self.delegate("stat", path, |fs, real| fs.stat(real))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn get_attribute(&self, path: &Path, name: AttrName) -> FsResult<AttrValue> {
        let real = self.real_path(path);
        let attr = self.real.stat(&real).map_err(|source| FsError::AttributeRead {
            path: path.to_path_buf(),
            real_path: real.clone(),
            source,
        })?;
        Ok(name.read(&attr))
    }

    #[tracing::instrument(level = "debug", skip(self, buf), fields(path = %path.display(), len = buf.len()))]
    fn write_file(&self, path: &Path, buf: &[u8], offset: u64) -> FsResult<usize> {
        self.delegate("write", path, |fs, real| fs.write_at(real, buf, offset))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn create_file(&self, path: &Path) -> FsResult<()> {
        self.delegate("create", path, |fs, real| fs.create(real))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn create_dir(&self, path: &Path) -> FsResult<()> {
        self.delegate("mkdir", path, |fs, real| fs.mkdir(real))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(from = %from.display(), to = %to.display()))]
    fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        let to_real = self.real_path(to);
        self.delegate("rename", from, |fs, from_real| fs.rename(from_real, &to_real))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn remove(&self, path: &Path, recursive: bool) -> FsResult<()> {
        if recursive {
            self.delegate("remove", path, |fs, real| fs.remove_all(real))
        } else {
            self.delegate("remove", path, |fs, real| fs.remove(real))
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn set_attribute(&self, path: &Path, value: AttrValue) -> FsResult<()> {
        match value {
            AttrValue::ModTime(mtime) => self.delegate("setattr", path, |fs, real| {
                fs.set_times(real, SystemTime::now(), mtime)
            }),
            AttrValue::Size(size) => {
                self.delegate("setattr", path, |fs, real| fs.truncate(real, size))
            }
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl<R: RealFs> fmt::Display for OsFs<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "os({})", self.root.display())
    }
}
