//! Virtual to real path translation.
//!
//! A virtual path is always interpreted as rooted at `/`, whatever its
//! actual prefix. It is normalized lexically before being joined onto the
//! root, so `..` segments can only cancel components of the virtual path
//! itself and the result never leaves the root.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Collect the normal components of `path` after resolving `.` and `..`.
///
/// A `..` with nothing left to cancel is dropped.
fn components(path: &Path) -> Vec<&OsStr> {
    let mut stack = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(name) => stack.push(name),
        }
    }
    stack
}

/// Normalize a virtual path into its absolute form.
///
/// The result always starts with `/` and contains no `.`, `..` or empty
/// segments. `""`, `"/"` and `"../.."` all normalize to `/`.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::from("/");
    out.extend(components(path.as_ref()));
    out
}

/// Translate a virtual path into a real path under `root`.
///
/// Total and pure: the result is `root` itself or a descendant of it for
/// every input.
pub fn translate(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let mut out = root.to_path_buf();
    out.extend(components(path.as_ref()));
    out
}
