//! Configuration provider using Figment

use crate::{
    discovery::{ConfigFile, ConfigFormat, FileDiscovery},
    types::ArborConfig,
    ConfigResult,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "ARBOR_";

/// Environment keys handled outside the configuration.
const IGNORED_ENV_KEYS: &[&str] = &["log"];

/// Loads [`ArborConfig`] from layered sources.
///
/// Later sources override earlier ones:
/// 1. Defaults
/// 2. Global then project configuration files
/// 3. `ARBOR_` environment variables
///
/// Nothing is cached; every load reads the sources again.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider reading files found by `discovery`.
    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Load the merged configuration.
    pub fn load(&self) -> ConfigResult<ArborConfig> {
        let config: ArborConfig = self.build_figment().extract()?;
        debug!(
            "Loaded configuration with {} additional settings",
            config.settings.len()
        );
        Ok(config)
    }

    fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ArborConfig::default()));

        for config_file in self.discovery.discover_all() {
            trace!(
                "Loading config file: {} ({:?})",
                config_file.path.display(),
                config_file.format
            );
            figment = figment.merge(file_provider(&config_file));
        }

        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(IGNORED_ENV_KEYS)
                .map(|key| key.as_str().to_lowercase().into()),
        )
    }
}

fn file_provider(config_file: &ConfigFile) -> Figment {
    let path = &config_file.path;
    match config_file.format {
        ConfigFormat::Toml => Figment::from(Toml::file(path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
        ConfigFormat::Json => Figment::from(Json::file(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn isolated(project: &TempDir, global: &TempDir) -> ConfigProvider {
        ConfigProvider::with_discovery(FileDiscovery::with_directories(
            Some(project.path().to_path_buf()),
            Some(global.path().to_path_buf()),
        ))
    }

    #[test]
    #[serial]
    fn test_defaults_without_sources() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let config = isolated(&project, &global).load().unwrap();
        assert_eq!(config.commands_dir, PathBuf::from("commands"));
        assert_eq!(config.name, None);
    }

    #[test]
    #[serial]
    fn test_project_overrides_global() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(
            global.path().join("arbor.toml"),
            "name = \"global\"\nregion = \"eu\"\n",
        )
        .unwrap();
        fs::write(project.path().join("arbor.yaml"), "name: project\n").unwrap();

        let config = isolated(&project, &global).load().unwrap();
        assert_eq!(config.name.as_deref(), Some("project"));
        assert_eq!(config.settings.get("region"), Some(&serde_json::json!("eu")));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_files() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(project.path().join("arbor.json"), r#"{"commands_dir": "cmds"}"#).unwrap();

        std::env::set_var("ARBOR_COMMANDS_DIR", "from-env");
        std::env::set_var("ARBOR_LOG", "trace");
        let config = isolated(&project, &global).load();
        std::env::remove_var("ARBOR_COMMANDS_DIR");
        std::env::remove_var("ARBOR_LOG");

        let config = config.unwrap();
        assert_eq!(config.commands_dir, PathBuf::from("from-env"));
        assert!(!config.settings.contains_key("log"));
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_an_error() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(project.path().join("arbor.toml"), "name = [unclosed").unwrap();
        assert!(isolated(&project, &global).load().is_err());
    }
}
