//! Driver configuration (`hydra.toml`).

use crate::cli::CompileArgs;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "hydra.toml";

/// Configuration for a compile run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output directory; `None` writes next to each input
    pub out_dir: Option<PathBuf>,

    /// Write `<stem>.ir`
    pub emit_binary: bool,

    /// Write `<stem>.tir`
    pub emit_text: bool,

    /// Worker threads; 0 uses one per CPU
    pub jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: None,
            emit_binary: true,
            emit_text: true,
            jobs: 0,
        }
    }
}

impl Config {
    /// Loads `path`, or `hydra.toml` when no path is given and the file
    /// exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(CONFIG_FILE).exists() => Path::new(CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Parses a TOML document.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies command line overrides.
    pub fn apply(&mut self, args: &CompileArgs) {
        if let Some(dir) = &args.out_dir {
            self.out_dir = Some(dir.clone());
        }
        if args.no_binary {
            self.emit_binary = false;
        }
        if args.no_text {
            self.emit_text = false;
        }
        if let Some(jobs) = args.jobs {
            self.jobs = jobs;
        }
    }
}
