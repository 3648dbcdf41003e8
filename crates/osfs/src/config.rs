//! Adapter configuration.
//!
//! ```toml
//! # osfs.toml
//! root = "~/export"
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};

/// Configuration for one exported root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OsFsConfig {
    /// Directory to export. `~` and `$VAR` are expanded.
    root: PathBuf,
}

impl OsFsConfig {
    /// Configuration exporting `root`.
    pub fn new(root: impl AsRef<str>) -> Self {
        Self {
            root: expand(root.as_ref()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> FsResult<Self> {
        Self::parse(text, Path::new("<config>"))
    }

    /// Read and parse a TOML file. Errors name the file.
    pub fn load(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FsError::construction(path, e))?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, origin: &Path) -> FsResult<Self> {
        let raw: OsFsConfig = toml::from_str(text).map_err(|e| {
            FsError::construction(origin, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        Ok(Self::new(raw.root.to_string_lossy()))
    }

    /// The configured root, expanded.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn expand(root: &str) -> PathBuf {
    match shellexpand::full(root) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(root).into_owned()),
    }
}
