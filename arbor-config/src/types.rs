//! Typed configuration for Arbor programs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Default location of the commands directory, relative to the working directory.
pub const DEFAULT_COMMANDS_DIR: &str = "commands";

/// Configuration of an Arbor program.
///
/// Keys other than the known ones are kept in `settings` so command
/// templates and handlers can read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub commands_dir: PathBuf,
    /// Logging filter directive, e.g. `debug` or `arbor=trace`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Force coloured output on or off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Default for ArborConfig {
    fn default() -> Self {
        Self {
            name: None,
            version: None,
            description: None,
            commands_dir: PathBuf::from(DEFAULT_COMMANDS_DIR),
            log_level: None,
            color: None,
            settings: Map::new(),
        }
    }
}
