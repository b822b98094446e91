//! The running application instance handed to every command.

use serde_json::{json, Map, Value};

use crate::terminal::Terminal;

/// Program metadata, configuration and output, shared read-only by handlers.
#[derive(Debug, Clone)]
pub struct App {
    name: String,
    version: Option<String>,
    description: String,
    config: Map<String, Value>,
    terminal: Terminal,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: String::new(),
            config: Map::new(),
            terminal: Terminal::stdio(),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Look up a configuration value by dotted path, e.g. `deploy.region`.
    pub fn config_value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.config.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Template-facing view of the application.
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "description": self.description,
            "config": self.config,
        })
    }
}
