//! Subcommands, one per capability-set operation.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use osfs::{AttrName, AttrValue, DirEntry, FileAttr, FileSystem, NamedAttributes};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print which directory is exported
    Describe,
    /// List a directory
    Ls { path: PathBuf },
    /// Show metadata
    Stat { path: PathBuf },
    /// Print file contents
    Cat {
        path: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Bytes to read (default: to end of file)
        #[arg(long)]
        len: Option<usize>,
    },
    /// Write text into an existing file
    Write {
        path: PathBuf,
        text: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Create an empty file, truncating an existing one
    Touch { path: PathBuf },
    /// Create a directory
    Mkdir { path: PathBuf },
    /// Move a file or directory
    Mv { from: PathBuf, to: PathBuf },
    /// Remove a file or empty directory
    Rm {
        path: PathBuf,
        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print one attribute (modtime, size)
    GetAttr { path: PathBuf, name: String },
    /// Set one attribute; modtime takes Unix seconds
    SetAttr {
        path: PathBuf,
        name: String,
        value: String,
    },
}

/// Listing entry as printed; names are shown lossily.
#[derive(Serialize)]
struct EntryOutput<'a> {
    name: String,
    attr: &'a FileAttr,
}

impl<'a> From<&'a DirEntry> for EntryOutput<'a> {
    fn from(entry: &'a DirEntry) -> Self {
        Self {
            name: entry.name.to_string_lossy().into_owned(),
            attr: &entry.attr,
        }
    }
}

/// Attribute as printed: timestamps as Unix seconds.
#[derive(Serialize)]
struct AttrOutput {
    name: AttrName,
    value: u64,
}

impl From<AttrValue> for AttrOutput {
    fn from(value: AttrValue) -> Self {
        let raw = match value {
            AttrValue::ModTime(t) => unix_secs(t),
            AttrValue::Size(n) => n,
        };
        Self {
            name: value.name(),
            value: raw,
        }
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Convert command-line text into a value for `name`.
pub fn parse_value(name: AttrName, text: &str) -> Result<AttrValue> {
    let n: u64 = text
        .parse()
        .with_context(|| format!("{name} expects an unsigned integer, got {text:?}"))?;
    Ok(match name {
        AttrName::ModTime => AttrValue::ModTime(
            UNIX_EPOCH
                .checked_add(Duration::from_secs(n))
                .ok_or_else(|| anyhow!("{name} {n} is out of range"))?,
        ),
        AttrName::Size => AttrValue::Size(n),
    })
}

fn print_attr(out: &mut impl Write, name: &str, attr: &FileAttr) -> Result<()> {
    let kind = match attr.kind {
        osfs::FileType::Directory => 'd',
        osfs::FileType::Symlink => 'l',
        osfs::FileType::File => '-',
        osfs::FileType::Other => '?',
    };
    writeln!(
        out,
        "{kind} {:04o} {:>10} {:>10} {name}",
        attr.perm,
        attr.size,
        unix_secs(attr.mtime)
    )?;
    Ok(())
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Run one command against `fs`, writing results to `out`.
pub fn run(fs: &dyn FileSystem, command: &Command, json: bool, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Describe => writeln!(out, "{}", fs.describe())?,
        Command::Ls { path } => {
            let entries: Vec<DirEntry> = fs.read_dir(path)?;
            let entries: Vec<EntryOutput> = entries.iter().map(EntryOutput::from).collect();
            if json {
                print_json(out, &entries)?;
            } else {
                for entry in &entries {
                    print_attr(out, &entry.name, entry.attr)?;
                }
            }
        }
        Command::Stat { path } => {
            let attr = fs.stat(path)?;
            if json {
                print_json(out, &attr)?;
            } else {
                print_attr(out, &path.display().to_string(), &attr)?;
            }
        }
        Command::Cat { path, offset, len } => {
            let len = match len {
                Some(len) => *len,
                None => (fs.stat(path)?.size.saturating_sub(*offset)) as usize,
            };
            let mut buf = vec![0u8; len];
            let n = fs.read_file(path, &mut buf, *offset)?;
            out.write_all(&buf[..n])?;
        }
        Command::Write { path, text, offset } => {
            let n = fs.write_file(path, text.as_bytes(), *offset)?;
            tracing::debug!(bytes = n, "written");
        }
        Command::Touch { path } => fs.create_file(path)?,
        Command::Mkdir { path } => fs.create_dir(path)?,
        Command::Mv { from, to } => fs.rename(from, to)?,
        Command::Rm { path, recursive } => fs.remove(path, *recursive)?,
        Command::GetAttr { path, name } => {
            let value = AttrOutput::from(fs.get_named_attribute(path, name)?);
            if json {
                print_json(out, &value)?;
            } else {
                writeln!(out, "{}", value.value)?;
            }
        }
        Command::SetAttr { path, name, value } => {
            let parsed = parse_value(AttrName::parse(name)?, value)?;
            fs.set_named_attribute(path, name, parsed)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use osfs::{MemoryFs, OsFs};
    use std::path::Path;

    fn export() -> OsFs<MemoryFs> {
        OsFs::with_real("/export", MemoryFs::new().with_dir("/export")).unwrap()
    }

    fn exec(fs: &dyn FileSystem, command: Command, json: bool) -> String {
        let mut out = Vec::new();
        run(fs, &command, json, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(AttrName::Size, "12").unwrap(), AttrValue::Size(12));
        assert_eq!(
            parse_value(AttrName::ModTime, "10").unwrap(),
            AttrValue::ModTime(UNIX_EPOCH + Duration::from_secs(10))
        );
        assert!(parse_value(AttrName::Size, "-1").is_err());
        assert!(parse_value(AttrName::Size, "big").is_err());

        let err = parse_value(AttrName::ModTime, &u64::MAX.to_string()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_touch_write_cat() {
        let fs = export();
        exec(&fs, Command::Touch { path: "/a.txt".into() }, false);
        exec(
            &fs,
            Command::Write {
                path: "/a.txt".into(),
                text: "hello".into(),
                offset: 0,
            },
            false,
        );

        let out = exec(
            &fs,
            Command::Cat {
                path: "/a.txt".into(),
                offset: 1,
                len: None,
            },
            false,
        );
        assert_eq!(out, "ello");
    }

    #[test]
    fn test_describe() {
        let fs = export();
        assert_eq!(exec(&fs, Command::Describe, false), "os(/export)\n");
    }

    #[test]
    fn test_set_and_get_attr() {
        let fs = export();
        exec(&fs, Command::Touch { path: "/f".into() }, false);
        exec(
            &fs,
            Command::SetAttr {
                path: "/f".into(),
                name: "modtime".into(),
                value: "1600000000".into(),
            },
            false,
        );

        let out = exec(
            &fs,
            Command::GetAttr {
                path: "/f".into(),
                name: "modtime".into(),
            },
            false,
        );
        assert_eq!(out, "1600000000\n");

        let out = exec(
            &fs,
            Command::GetAttr {
                path: "/f".into(),
                name: "size".into(),
            },
            true,
        );
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "size");
        assert_eq!(value["value"], 0);
    }

    #[test]
    fn test_unknown_attr_fails() {
        let fs = export();
        let mut out = Vec::new();
        let command = Command::GetAttr {
            path: "/f".into(),
            name: "owner".into(),
        };
        let err = run(&fs, &command, false, &mut out).unwrap_err();
        assert!(err.to_string().contains("unsupported attribute"));
    }

    #[test]
    fn test_ls_json() {
        let fs = export();
        exec(&fs, Command::Mkdir { path: "/d".into() }, false);
        exec(&fs, Command::Touch { path: "/d/x".into() }, false);

        let out = exec(&fs, Command::Ls { path: "/d".into() }, true);
        let entries: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(entries[0]["name"], "x");
        assert_eq!(entries[0]["attr"]["kind"], "file");
    }

    #[test]
    fn test_rm_recursive() {
        let fs = export();
        exec(&fs, Command::Mkdir { path: "/d".into() }, false);
        exec(&fs, Command::Touch { path: "/d/x".into() }, false);

        let mut out = Vec::new();
        let rm = Command::Rm {
            path: "/d".into(),
            recursive: false,
        };
        assert!(run(&fs, &rm, false, &mut out).is_err());

        let rm = Command::Rm {
            path: "/d".into(),
            recursive: true,
        };
        run(&fs, &rm, false, &mut out).unwrap();
        assert!(fs.stat(Path::new("/d")).is_err());
    }
}
