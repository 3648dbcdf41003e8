//! # osfs
//!
//! Filesystem adapter that presents a real directory as a virtual
//! filesystem rooted at `/`.
//!
//! Key components:
//!
//! - [`translate`] - Maps a virtual path to a real path that can never
//!   leave the configured root
//! - [`FileSystem`] - The capability set (read, write, create, move,
//!   remove, list, stat, attributes)
//! - [`OsFs`] - Adapter implementing [`FileSystem`] over a [`RealFs`]
//! - [`AttrName`] / [`AttrValue`] - Typed file attributes, with a
//!   string-keyed surface in [`NamedAttributes`]
//! - [`HostFs`] / [`MemoryFs`] - Host and in-memory real filesystems
//!
//! ## Design Decisions
//!
//! - **Lexical containment**: every virtual path is forced absolute and
//!   normalized before it is joined onto the root, so `..` can only cancel
//!   components of the virtual path itself.
//! - **One hop**: each operation translates once and delegates once. There
//!   is no cache and no per-file state.
//! - **Synchronous**: operations block for the duration of the host I/O.
//!
//! ```no_run
//! use std::path::Path;
//! use osfs::{FileSystem, OsFs};
//!
//! # fn main() -> osfs::FsResult<()> {
//! let fs = OsFs::new("/export")?;
//! fs.create_file(Path::new("/a.txt"))?;
//! fs.write_file(Path::new("/a.txt"), b"hello", 0)?;
//! # Ok(())
//! # }
//! ```

mod adapter;
mod attr;
mod config;
mod error;
mod ops;
mod path;
pub mod real;
mod types;

pub use adapter::OsFs;
pub use attr::{AttrName, AttrValue, NamedAttributes};
pub use config::OsFsConfig;
pub use error::{FsError, FsResult};
pub use ops::FileSystem;
pub use path::{normalize, translate};
pub use real::{HostFs, MemoryFs, RealFs};
pub use types::{DirEntry, FileAttr, FileType};
