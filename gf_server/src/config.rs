//! Optional JSON configuration file for the host.
//!
//! A missing file is not an error; every field falls back to its
//! default, and command line options override the file.

use anyhow::{Context, Error};
use serde::Deserialize;
use std::{fs, path::Path};

use go_fish::constants::{DEFAULT_HOST, DEFAULT_PORT};

/// Host settings as read from disk. Any field may be omitted.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub default_host: String,
    pub default_port: u16,
    pub players: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_HOST.to_string(),
            default_port: DEFAULT_PORT,
            players: 2,
        }
    }
}

impl FileConfig {
    /// Loads settings from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("couldn't read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("couldn't parse {}", path.display()))
    }
}
