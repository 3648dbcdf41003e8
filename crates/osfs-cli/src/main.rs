//! osfs command-line front end.
//!
//! Exports one directory and runs a single operation against it.
//!
//! Usage:
//!   osfs --root /export ls /
//!   osfs --root /export write /a.txt "hello"
//!   osfs --config osfs.toml set-attr /a.txt modtime 1600000000
//!   RUST_LOG=osfs=debug osfs --root /export stat /../../etc/passwd

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use osfs::{OsFs, OsFsConfig};
use tracing_subscriber::{EnvFilter, fmt};

use commands::Command;

/// Run filesystem operations inside an exported directory.
#[derive(Parser, Debug)]
#[command(name = "osfs")]
#[command(about = "Run filesystem operations inside an exported directory")]
struct Args {
    /// Directory to export
    #[arg(long, env = "OSFS_ROOT")]
    root: Option<String>,

    /// TOML config file naming the root
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Resolve configuration; `--root` wins over `--config`.
    fn config(&self) -> Result<OsFsConfig> {
        match (&self.root, &self.config) {
            (Some(root), _) => Ok(OsFsConfig::new(root)),
            (None, Some(path)) => OsFsConfig::load(path)
                .with_context(|| format!("loading config {}", path.display())),
            (None, None) => bail!("no root given: pass --root, --config or set OSFS_ROOT"),
        }
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    let fs = OsFs::from_config(&config)
        .with_context(|| format!("exporting {}", config.root().display()))?;
    tracing::info!(fs = %fs, "ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&fs, &args.command, args.json, &mut out)
}
