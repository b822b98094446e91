//! Configuration for Arbor programs.
//!
//! Settings are layered with [figment]: built-in defaults, then
//! `~/.arbor/arbor.*`, then `./.arbor/arbor.*`, then `ARBOR_` environment
//! variables. Package metadata defaults come from the nearest `Cargo.toml`.

pub mod discovery;
pub mod error;
pub mod manifest;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::ConfigError;
pub use manifest::PackageManifest;
pub use provider::ConfigProvider;
pub use types::{ArborConfig, DEFAULT_COMMANDS_DIR};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load configuration from every default source.
pub fn load_configuration() -> ConfigResult<ArborConfig> {
    ConfigProvider::new().load()
}
