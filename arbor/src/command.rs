//! The command tree.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::component::Component;
use crate::schema::Schema;

/// Child commands keyed by name, in discovery order.
pub type CommandMap = IndexMap<String, Command>;

/// What a loaded command module provides.
#[derive(Clone, Default)]
pub struct CommandModule {
    pub description: Option<String>,
    pub is_default: bool,
    pub alias: Option<String>,
    pub options: Option<Schema>,
    pub args: Option<Schema>,
    pub component: Option<Arc<dyn Component>>,
    /// Any further metadata, passed through unchanged.
    pub extra: Map<String, Value>,
}

/// A node of the command tree: a runnable leaf, a group, or both.
#[derive(Clone, Default)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub alias: Option<String>,
    pub is_default: bool,
    pub options: Option<Schema>,
    pub args: Option<Schema>,
    pub component: Option<Arc<dyn Component>>,
    pub commands: Option<CommandMap>,
    pub extra: Map<String, Value>,
    /// File or directory the command was discovered from.
    pub source: Option<PathBuf>,
}

impl Command {
    /// A command defined by a single module.
    pub fn from_module(name: impl Into<String>, module: CommandModule, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: module.description,
            alias: module.alias,
            is_default: module.is_default,
            options: module.options,
            args: module.args,
            component: module.component,
            commands: None,
            extra: module.extra,
            source: Some(source.into()),
        }
    }

    /// A pure group with no handler of its own.
    pub fn group(name: impl Into<String>, commands: CommandMap, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            commands: Some(commands),
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn is_runnable(&self) -> bool {
        self.component.is_some()
    }

    pub fn children(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().flat_map(|commands| commands.values())
    }
}

impl fmt::Debug for CommandModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandModule")
            .field("description", &self.description)
            .field("is_default", &self.is_default)
            .field("alias", &self.alias)
            .field("options", &self.options.is_some())
            .field("args", &self.args.is_some())
            .field("component", &self.component.is_some())
            .field("extra", &self.extra)
            .finish()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("alias", &self.alias)
            .field("is_default", &self.is_default)
            .field("options", &self.options.is_some())
            .field("args", &self.args.is_some())
            .field("component", &self.component.is_some())
            .field("commands", &self.commands)
            .field("source", &self.source)
            .finish()
    }
}
