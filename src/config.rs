//! Configuration file handling.
//!
//! The configuration lives in `config.json` at the program root and holds the
//! account id to label mapping plus the regions collectors scan by default.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::AccountResolver;
use crate::error::{Result, ToolError};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const OUTPUT_DIR_NAME: &str = "output";

const DEFAULT_REGIONS: [&str; 4] = ["us-east-1", "us-east-2", "us-west-1", "us-west-2"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account id → human-readable label.
    pub account_mappings: BTreeMap<String, String>,

    /// Regions scanned when the user does not pick one.
    pub default_regions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_mappings: BTreeMap::new(),
            default_regions: DEFAULT_REGIONS.iter().map(|region| region.to_string()).collect(),
        }
    }
}

impl Config {
    /// Loads the configuration at `path`. When the file does not exist a
    /// default skeleton is written there and the defaults are returned.
    pub fn load_or_bootstrap(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "wrote default configuration"),
                Err(error) => warn!(
                    path = %path.display(),
                    %error,
                    "could not write default configuration"
                ),
            }
            return Ok(config);
        }

        Self::load(path)
    }

    /// Loads the configuration at `path`, failing if it is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|error| ToolError::InvalidConfig {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn resolver(&self) -> AccountResolver {
        AccountResolver::new(self.account_mappings.clone())
    }

    /// Configured default regions with malformed names skipped.
    pub fn regions(&self) -> Vec<&str> {
        self.default_regions
            .iter()
            .map(String::as_str)
            .filter(|region| {
                let valid = is_region_name(region);
                if !valid {
                    warn!(region, "skipping invalid region in configuration");
                }
                valid
            })
            .collect()
    }
}

/// Checks the `{area}-{direction}-{number}` region naming scheme, e.g.
/// `us-east-1` or `us-gov-west-1`.
pub fn is_region_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('-').collect();
    if !(3..=4).contains(&parts.len()) {
        return false;
    }

    let (area, rest) = (parts[0], &parts[1..]);
    let (number, words) = match rest.split_last() {
        Some(split) => split,
        None => return false,
    };

    let is_lower_word =
        |part: &&str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_lowercase());

    area.len() == 2
        && is_lower_word(&area)
        && words.iter().all(|word| is_lower_word(word))
        && !number.is_empty()
        && number.chars().all(|ch| ch.is_ascii_digit())
}

/// Directory the program runs from: the executable's directory, or its parent
/// when the executable sits in a `scripts` directory.
pub fn program_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(root_for_dir))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn root_for_dir(dir: &Path) -> PathBuf {
    let in_scripts = dir
        .file_name()
        .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case("scripts"));
    match dir.parent() {
        Some(parent) if in_scripts => parent.to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

pub fn default_config_path() -> PathBuf {
    program_root().join(CONFIG_FILE_NAME)
}

pub fn default_output_dir() -> PathBuf {
    program_root().join(OUTPUT_DIR_NAME)
}
