//! Host filesystem.

use rustix::fs::{AtFlags, Mode, OFlags, Timespec, Timestamps};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::RealFs;
use crate::types::{DirEntry, FileAttr};

/// [`RealFs`] backed by `std::fs`.
///
/// File handles are opened per call and closed on every exit path when
/// they drop.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl HostFs {
    /// Create a host filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

impl RealFs for HostFs {
    fn read_at(&self, path: &Path, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let file = File::open(path)?;
        let mut filled = 0;
        while filled < buf.len() {
            match file.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn write_at(&self, path: &Path, buf: &[u8], offset: u64) -> io::Result<usize> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        file.write_all_at(buf, offset)?;
        Ok(buf.len())
    }

    fn create(&self, path: &Path) -> io::Result<()> {
        File::create(path).map(drop)
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(DirEntry::new(entry.file_name(), FileAttr::from(&meta)));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> io::Result<FileAttr> {
        fs::metadata(path).map(|meta| FileAttr::from(&meta))
    }

    fn truncate(&self, path: &Path, size: u64) -> io::Result<()> {
        // Non-blocking so a fifo fails instead of waiting for a peer.
        let flags = OFlags::WRONLY | OFlags::NONBLOCK | OFlags::CLOEXEC;
        let fd = rustix::fs::open(path, flags, Mode::empty())?;
        rustix::fs::ftruncate(&fd, size)?;
        Ok(())
    }

    fn set_times(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        let times = Timestamps {
            last_access: timespec(atime)?,
            last_modification: timespec(mtime)?,
        };
        rustix::fs::utimensat(rustix::fs::CWD, path, &times, AtFlags::empty())?;
        Ok(())
    }
}

fn timespec(t: SystemTime) -> io::Result<Timespec> {
    let out_of_range = || io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range");
    let (secs, nanos) = match t.duration_since(UNIX_EPOCH) {
        Ok(d) => (
            i64::try_from(d.as_secs()).map_err(|_| out_of_range())?,
            d.subsec_nanos(),
        ),
        Err(e) => {
            let d = e.duration();
            let secs = i64::try_from(d.as_secs()).map_err(|_| out_of_range())?;
            match d.subsec_nanos() {
                0 => (-secs, 0),
                n => (-secs - 1, 1_000_000_000 - n),
            }
        }
    };
    Ok(Timespec {
        tv_sec: secs,
        tv_nsec: nanos.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (HostFs, TempDir) {
        (HostFs::new(), TempDir::new().unwrap())
    }

    #[test]
    fn test_create_write_read() {
        let (fs, dir) = setup();
        let path = dir.path().join("test.txt");

        fs.create(&path).unwrap();
        assert_eq!(fs.write_at(&path, b"hello world", 0).unwrap(), 11);

        let mut buf = [0u8; 5];
        assert_eq!(fs.read_at(&path, &mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn test_short_read_at_eof() {
        let (fs, dir) = setup();
        let path = dir.path().join("short.txt");
        std::fs::write(&path, b"abc").unwrap();

        let mut buf = [0u8; 10];
        assert_eq!(fs.read_at(&path, &mut buf, 1).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
        assert_eq!(fs.read_at(&path, &mut buf, 50).unwrap(), 0);
    }

    #[test]
    fn test_write_requires_existing_file() {
        let (fs, dir) = setup();
        let err = fs.write_at(&dir.path().join("nope"), b"x", 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_create_truncates() {
        let (fs, dir) = setup();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, b"old contents").unwrap();

        fs.create(&path).unwrap();
        assert_eq!(fs.stat(&path).unwrap().size, 0);
    }

    #[test]
    fn test_remove_non_empty_dir() {
        let (fs, dir) = setup();
        let sub = dir.path().join("sub");
        fs.mkdir(&sub).unwrap();
        fs.create(&sub.join("f")).unwrap();

        assert!(fs.remove(&sub).is_err());
        fs.remove_all(&sub).unwrap();
        assert!(!sub.exists());

        // Already gone.
        fs.remove_all(&sub).unwrap();
    }

    #[test]
    fn test_list_sorted_with_metadata() {
        let (fs, dir) = setup();
        fs.create(&dir.path().join("b.txt")).unwrap();
        fs.mkdir(&dir.path().join("a")).unwrap();

        let entries = fs.list(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.to_str().unwrap()).collect();
        assert_eq!(names, ["a", "b.txt"]);
        assert!(entries[0].kind().is_dir());
        assert!(entries[1].kind().is_file());
    }

    #[test]
    fn test_truncate_and_set_times() {
        let (fs, dir) = setup();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, b"hello world").unwrap();

        fs.truncate(&path, 5).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        fs.set_times(&path, SystemTime::now(), mtime).unwrap();
        assert_eq!(fs.stat(&path).unwrap().mtime, mtime);

        let before = UNIX_EPOCH - Duration::from_millis(1500);
        fs.set_times(&path, SystemTime::now(), before).unwrap();
        assert_eq!(fs.stat(&path).unwrap().mtime, before);
    }

    #[test]
    fn test_set_times_missing_file() {
        let (fs, dir) = setup();
        let err = fs
            .set_times(&dir.path().join("nope"), SystemTime::now(), SystemTime::now())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
