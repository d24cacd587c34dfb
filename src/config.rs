// CLI configuration loaded from YAML

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "taskboard";
const CONFIG_FILE: &str = "config.yml";
const BOARD_FILE: &str = "board.jsonl";

/// How new list and task ids are generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Uuid,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where the CLI keeps the board between runs
    pub board_path: PathBuf,
    pub id_strategy: IdStrategy,
    /// Start from the demo board when no snapshot exists
    pub seed_demo_board: bool,
    /// Colorize terminal output
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_path: default_board_path(),
            id_strategy: IdStrategy::default(),
            seed_demo_board: true,
            color: true,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid config")
    }

    /// Load `explicit` if given, else the per-user config file if it exists,
    /// else defaults. An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                path.to_path_buf()
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => {
                    debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(file = ?path, "Loading config");
        let yaml = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&yaml)
    }
}

/// `<config dir>/taskboard/config.yml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

/// `<data dir>/taskboard/board.jsonl`, or the working directory without one
pub fn default_board_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(BOARD_FILE)
}
