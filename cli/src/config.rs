//! Simulator configuration
//!
//! ```toml
//! data_dir = "sysres-data"
//! privileged = ["sys"]
//! keep_snapshots = 20
//!
//! [system]
//! system_account = "sys"
//! refund_delay_sec = 259200
//! ```

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysres_core::SystemConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the state snapshots
    pub data_dir: PathBuf,

    /// Accounts that may trade while the market is closed
    pub privileged: Vec<String>,

    /// Snapshots kept after each call
    pub keep_snapshots: usize,

    pub system: SystemConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("sysres-data"),
            privileged: Vec::new(),
            keep_snapshots: 20,
            system: SystemConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(contents).context("invalid configuration")?;
        config
            .system
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid system configuration: {}", e))?;
        Ok(config)
    }
}

/// Read the configuration file, or the defaults when none is given.
///
/// A missing file falls back to the defaults with a warning; a file that
/// exists but does not parse is an error.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(contents) => CliConfig::from_toml(&contents)
            .with_context(|| format!("loading {}", path.display())),
        Err(e) => {
            warn!("could not read config {}: {}, using defaults", path.display(), e);
            Ok(CliConfig::default())
        }
    }
}
