//! Registration of the command tree onto clap.
//!
//! clap owns parsing and help output. Alongside the `clap::Command` tree the
//! registrar builds a [`CommandNode`] tree that holds what clap cannot: the
//! bound [`Action`] of each command and which child is a group's default.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use clap::{Arg, ArgAction};
use indexmap::IndexMap;
use tracing::debug;

use crate::app::App;
use crate::command::{Command, CommandMap};
use crate::component::AppComponent;
use crate::error::{Error, Result};
use crate::extract::{extract_arguments, extract_options, OptionSpec};
use crate::invocation::Action;

/// Name of the help meta-command.
pub const HELP_COMMAND: &str = "help";

/// Id of the `-h, --help` flag.
pub const HELP_FLAG: &str = "help";

/// Id of the `-v, --version` flag.
pub const VERSION_FLAG: &str = "version";

/// Id of the `help` meta-command's positional.
const HELP_TARGET: &str = "command";

/// Shared state every bound action receives.
#[derive(Clone)]
pub struct RegistrationContext {
    pub app_component: Arc<dyn AppComponent>,
    pub app: Arc<App>,
}

/// Dispatch information for one registered command.
#[derive(Debug, Default)]
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    pub action: Option<Arc<Action>>,
    pub default_child: Option<String>,
    pub children: IndexMap<String, CommandNode>,
    pub has_help_command: bool,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find a child by name or alias.
    pub fn child(&self, token: &str) -> Option<&CommandNode> {
        self.children.get(token).or_else(|| {
            self.children
                .values()
                .find(|child| child.aliases.iter().any(|alias| alias == token))
        })
    }

    /// The child that runs when this node is invoked without a subcommand.
    pub fn default_child(&self) -> Option<&CommandNode> {
        self.default_child
            .as_deref()
            .and_then(|name| self.children.get(name))
    }
}

/// A clap command with the flags every level shares.
pub fn base_command(name: impl Into<String>) -> clap::Command {
    clap::Command::new(name.into())
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .disable_version_flag(true)
        .arg(
            Arg::new(HELP_FLAG)
                .short('h')
                .long("help")
                .action(ArgAction::Help)
                .help("Show help"),
        )
}

fn help_command() -> clap::Command {
    base_command(HELP_COMMAND)
        .about("Show help for command")
        .arg(
            Arg::new(HELP_TARGET)
                .value_name("command")
                .action(ArgAction::Append)
                .num_args(0..),
        )
}

/// Command path requested by a `help` meta-command invocation.
pub fn help_target(matches: &clap::ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(HELP_TARGET)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Apply `command`'s own surface to `cli` and bind its action on `node`.
///
/// Children are not touched; see [`register_commands`].
pub fn register_command(
    mut cli: clap::Command,
    node: &mut CommandNode,
    command: &Command,
    context: &RegistrationContext,
    is_root: bool,
) -> Result<clap::Command> {
    if let Some(description) = &command.description {
        cli = cli.about(description.clone());
    }
    if let Some(alias) = &command.alias {
        cli = cli.visible_alias(alias.clone());
        node.aliases.push(alias.clone());
    }

    let option_specs = match &command.options {
        Some(schema) => extract_options(schema)?,
        None => Vec::new(),
    };
    check_flags(&command.name, &option_specs, is_root)?;
    for spec in &option_specs {
        cli = cli.arg(spec.to_arg());
    }

    let argument_specs = match &command.args {
        Some(schema) => extract_arguments(schema)?,
        None => Vec::new(),
    };
    for (index, spec) in argument_specs.iter().enumerate() {
        cli = cli.arg(spec.to_arg(index));
    }

    if let Some(component) = &command.component {
        let action = Action::new(
            command.name.clone(),
            command.options.clone(),
            option_specs,
            command.args.clone(),
            argument_specs,
            Arc::clone(component),
            Arc::clone(&context.app_component),
            Arc::clone(&context.app),
        );
        debug!(
            command = %command.name,
            variadic = action.has_variadic_argument(),
            "bound command action"
        );
        node.action = Some(Arc::new(action));
    }

    Ok(cli)
}

/// Register every entry of `commands` as a subcommand of `parent`.
pub fn register_commands(
    mut parent: clap::Command,
    parent_node: &mut CommandNode,
    commands: &CommandMap,
    context: &RegistrationContext,
) -> Result<clap::Command> {
    check_defaults(&parent_node.name, commands)?;
    check_names(&parent_node.name, commands)?;

    for (name, command) in commands {
        let mut node = CommandNode::new(name.clone());
        let mut child = register_command(base_command(name.clone()), &mut node, command, context, false)?;
        if let Some(nested) = &command.commands {
            child = register_commands(child, &mut node, nested, context)?;
        }

        if command.is_default {
            parent_node.default_child = Some(name.clone());
        }
        debug!(parent = %parent_node.name, command = %name, "registered command");
        parent = parent.subcommand(child);
        parent_node.children.insert(name.clone(), node);
    }

    if !commands.is_empty() {
        parent = parent.subcommand(help_command());
        parent_node.has_help_command = true;
    }
    Ok(parent)
}

fn check_defaults(parent: &str, commands: &CommandMap) -> Result<()> {
    let defaults: Vec<&str> = commands
        .values()
        .filter(|command| command.is_default)
        .map(|command| command.name.as_str())
        .collect();
    if defaults.len() > 1 {
        return Err(Error::MultipleDefaults {
            parent: parent.to_string(),
            names: defaults.join(", "),
        });
    }
    Ok(())
}

/// Every name and alias of one level must be distinct, and none may be `help`.
fn check_names(parent: &str, commands: &CommandMap) -> Result<()> {
    let mut seen: HashMap<&str, &Command> = HashMap::new();
    for command in commands.values() {
        for name in std::iter::once(&command.name).chain(&command.alias) {
            if name == HELP_COMMAND {
                return Err(Error::ReservedName {
                    name: name.clone(),
                    parent: parent.to_string(),
                });
            }
            if let Some(owner) = seen.insert(name.as_str(), command) {
                return Err(Error::DuplicateCommand {
                    name: name.clone(),
                    first: owner.source.clone().unwrap_or_default(),
                    second: command.source.clone().unwrap_or_default(),
                });
            }
        }
    }
    Ok(())
}

fn check_flags(command: &str, specs: &[OptionSpec], is_root: bool) -> Result<()> {
    let mut longs: HashSet<String> = HashSet::from(["help".to_string()]);
    let mut shorts: HashSet<String> = HashSet::from(["h".to_string()]);
    if is_root {
        longs.insert("version".to_string());
        shorts.insert("v".to_string());
    }

    for spec in specs {
        let conflict = |flag: String, what: &str| Error::FlagConflict {
            command: command.to_string(),
            flag,
            conflict: what.to_string(),
        };

        if !longs.insert(spec.long.clone()) {
            return Err(conflict(format!("--{}", spec.long), "a reserved or repeated flag"));
        }
        if let Some(alias) = &spec.alias {
            let inserted = if alias.chars().count() == 1 {
                shorts.insert(alias.clone())
            } else {
                longs.insert(alias.clone())
            };
            if !inserted {
                return Err(conflict(alias.clone(), "a reserved or repeated alias"));
            }
        }
    }
    Ok(())
}
