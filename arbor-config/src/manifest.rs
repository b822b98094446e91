//! Package manifest discovery.
//!
//! A program takes its default name, version and description from the
//! nearest `Cargo.toml` with a `[package]` table above its commands directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::ConfigResult;

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Package metadata read from a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// The manifest the values were read from.
    pub path: Option<PathBuf>,
}

impl PackageManifest {
    /// Walk up from `start` to the nearest manifest with a `[package]` table.
    ///
    /// Returns an empty manifest when none is found.
    pub fn find_up(start: &Path) -> ConfigResult<Self> {
        let start = if start.is_absolute() {
            start.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|_| ConfigError::CurrentDirectoryNotFound)?
                .join(start)
        };

        for dir in start.ancestors() {
            let candidate = dir.join(MANIFEST_FILE);
            if !candidate.is_file() {
                continue;
            }
            let manifest = Self::from_path(&candidate)?;
            if manifest.path.is_some() {
                debug!("Using package manifest {}", candidate.display());
                return Ok(manifest);
            }
        }
        Ok(Self::default())
    }

    /// Read a manifest. A manifest without `[package]`, such as a virtual
    /// workspace root, yields an empty result.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::file_read(path, e))?;
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| ConfigError::manifest(path, e))?;

        let Some(package) = table.get("package").and_then(toml::Value::as_table) else {
            return Ok(Self::default());
        };
        // Workspace-inherited fields are tables, not strings, and are skipped.
        let text = |key: &str| package.get(key).and_then(toml::Value::as_str).map(str::to_owned);

        Ok(Self {
            name: text("name"),
            version: text("version"),
            description: text("description"),
            path: Some(path.to_path_buf()),
        })
    }
}
