//! Typed file attributes.
//!
//! Attributes are a closed set. [`AttrName`] names one, [`AttrValue`]
//! carries a strongly-typed value for one. The typed surface on
//! [`FileSystem`] cannot express a type mismatch; the string-keyed
//! surface in [`NamedAttributes`] checks names and value kinds at call
//! time, before touching the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::error::{FsError, FsResult};
use crate::ops::FileSystem;
use crate::types::FileAttr;

/// Name of a recognized attribute.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttrName {
    /// Last modification time.
    ModTime,
    /// Size in bytes.
    Size,
}

impl AttrName {
    /// Parse a wire name, failing with `UnsupportedAttribute`.
    pub fn parse(name: &str) -> FsResult<Self> {
        <Self as FromStr>::from_str(name).map_err(|_| FsError::unsupported_attribute(name))
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Kind of value this attribute carries.
    pub fn value_kind(&self) -> &'static str {
        match self {
            AttrName::ModTime => "timestamp",
            AttrName::Size => "integer",
        }
    }

    /// Read this attribute out of a metadata record.
    pub fn read(&self, attr: &FileAttr) -> AttrValue {
        match self {
            AttrName::ModTime => AttrValue::ModTime(attr.mtime),
            AttrName::Size => AttrValue::Size(attr.size),
        }
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value tagged with the attribute it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrValue {
    /// New or current modification time.
    ModTime(SystemTime),
    /// New or current size in bytes.
    Size(u64),
}

impl AttrValue {
    /// Attribute this value belongs to.
    pub fn name(&self) -> AttrName {
        match self {
            AttrValue::ModTime(_) => AttrName::ModTime,
            AttrValue::Size(_) => AttrName::Size,
        }
    }

    /// Kind of the carried value.
    pub fn kind(&self) -> &'static str {
        self.name().value_kind()
    }

    /// Check that this value may be assigned to `name`.
    pub fn check_for(self, name: AttrName) -> FsResult<Self> {
        if self.name() == name {
            Ok(self)
        } else {
            Err(FsError::InvalidAttributeValue {
                name,
                expected: name.value_kind(),
                found: self.kind(),
            })
        }
    }

    /// The timestamp, if this is a modification time.
    pub fn as_time(&self) -> Option<SystemTime> {
        match self {
            AttrValue::ModTime(t) => Some(*t),
            AttrValue::Size(_) => None,
        }
    }

    /// The size, if this is a size.
    pub fn as_size(&self) -> Option<u64> {
        match self {
            AttrValue::Size(n) => Some(*n),
            AttrValue::ModTime(_) => None,
        }
    }
}

/// String-keyed attribute access for callers that only have a name.
///
/// Implemented for every [`FileSystem`]. Name and value checks run before
/// any filesystem call.
pub trait NamedAttributes {
    /// Get the attribute called `name`.
    fn get_named_attribute(&self, path: &Path, name: &str) -> FsResult<AttrValue>;

    /// Set the attribute called `name` to `value`.
    fn set_named_attribute(&self, path: &Path, name: &str, value: AttrValue) -> FsResult<()>;
}

impl<T: FileSystem + ?Sized> NamedAttributes for T {
    fn get_named_attribute(&self, path: &Path, name: &str) -> FsResult<AttrValue> {
        let name = AttrName::parse(name)?;
        self.get_attribute(path, name)
    }

    fn set_named_attribute(&self, path: &Path, name: &str, value: AttrValue) -> FsResult<()> {
        let name = AttrName::parse(name)?;
        let value = value.check_for(name)?;
        self.set_attribute(path, value)
    }
}
