//! Configuration file for journalscope
//!
//! Every setting is optional; command line flags take precedence.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use journalscope_types::LogFormatter;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Gateway base URL, e.g. `http://localhost:19531`
    pub gateway_url: Option<String>,

    /// Request timeout in seconds (ignored when following)
    pub timeout_secs: Option<u64>,

    /// Output line format
    pub format: Option<LogFormatter>,

    /// Timestamp offset such as `+02:00`
    pub utc_offset: Option<String>,
}

impl Config {
    /// Load the config file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).context(format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
