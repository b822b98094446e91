//! Program entry point: discover, register, parse, dispatch.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arbor_config::{ArborConfig, PackageManifest};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction};
use serde_json::{Map, Value};
use tracing::debug;

use crate::app::App;
use crate::app_resolver::read_custom_app;
use crate::component::{AppComponent, DefaultApp};
use crate::error::{Error, Result};
use crate::loader::{MarkdownLoader, ModuleLoader};
use crate::registrar::{
    base_command, help_target, register_command, register_commands, CommandNode,
    RegistrationContext, HELP_COMMAND, VERSION_FLAG,
};
use crate::terminal::Terminal;
use crate::tree::{read_commands, INDEX_COMMAND};

/// Name used when nothing else names the program.
pub const FALLBACK_NAME: &str = "arbor";

/// How to build a program.
#[derive(Clone)]
pub struct ProgramOptions {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub commands_dir: PathBuf,
    /// Configuration values exposed to handlers through [`App`].
    pub config: Map<String, Value>,
    pub terminal: Terminal,
    pub loader: Arc<dyn ModuleLoader>,
}

impl fmt::Debug for ProgramOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramOptions")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("commands_dir", &self.commands_dir)
            .finish_non_exhaustive()
    }
}

impl ProgramOptions {
    pub fn new(commands_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            version: None,
            description: None,
            commands_dir: commands_dir.into(),
            config: Map::new(),
            terminal: Terminal::stdio(),
            loader: Arc::new(MarkdownLoader::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }
}

impl From<ArborConfig> for ProgramOptions {
    fn from(config: ArborConfig) -> Self {
        let terminal = match config.color {
            Some(color) => Terminal::stdio().with_color(color),
            None => Terminal::stdio(),
        };
        Self {
            name: config.name,
            version: config.version,
            description: config.description,
            commands_dir: config.commands_dir,
            config: config.settings,
            terminal,
            loader: Arc::new(MarkdownLoader::new()),
        }
    }
}

/// A directory-driven command-line program.
#[derive(Debug, Clone)]
pub struct Program {
    options: ProgramOptions,
}

impl Program {
    pub fn new(options: ProgramOptions) -> Self {
        Self { options }
    }

    /// Build the program and run it against `argv`, program name first.
    pub async fn run<I, T>(&self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let invoked_as = argv
            .first()
            .and_then(|first| Path::new(first).file_name())
            .and_then(|name| name.to_str())
            .map(str::to_owned);
        let cli = self.build(invoked_as.as_deref()).await?;
        cli.dispatch(argv).await
    }

    /// Discover commands and register them. The tree is read fresh each time.
    pub async fn build(&self, invoked_as: Option<&str>) -> Result<Cli> {
        let directory = &self.options.commands_dir;
        let loader = self.options.loader.as_ref();

        let app_component: Arc<dyn AppComponent> = match read_custom_app(directory, loader).await? {
            Some(custom) => custom,
            None => Arc::new(DefaultApp),
        };
        let mut commands = read_commands(directory, loader).await?;
        let index = commands.shift_remove(INDEX_COMMAND);
        let package = PackageManifest::find_up(directory)?;

        let name = self
            .options
            .name
            .clone()
            .or(package.name)
            .or_else(|| invoked_as.map(str::to_owned))
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        let version = self.options.version.clone().or(package.version);
        let description = index
            .as_ref()
            .and_then(|index| index.description.clone())
            .or_else(|| self.options.description.clone())
            .or(package.description)
            .unwrap_or_default();
        debug!(%name, ?version, commands = commands.len(), "building program");

        let app = Arc::new(
            App::new(name.clone())
                .with_version(version.clone())
                .with_description(description.clone())
                .with_config(self.options.config.clone())
                .with_terminal(self.options.terminal.clone()),
        );
        let context = RegistrationContext {
            app_component,
            app: Arc::clone(&app),
        };

        let mut root = CommandNode::new(name.clone());
        let mut program = base_command(name.clone()).bin_name(name);
        if let Some(version) = version {
            program = program.version(version).arg(
                Arg::new(VERSION_FLAG)
                    .short('v')
                    .long("version")
                    .action(ArgAction::Version)
                    .help("Show version number"),
            );
        }
        if let Some(index) = &index {
            program = register_command(program, &mut root, index, &context, true)?;
        }
        program = register_commands(program, &mut root, &commands, &context)?;
        if !description.is_empty() {
            program = program.about(description);
        }

        Ok(Cli {
            command: program,
            root,
            app,
        })
    }
}

/// A registered program, ready to parse arguments.
#[derive(Debug)]
pub struct Cli {
    command: clap::Command,
    root: CommandNode,
    app: Arc<App>,
}

impl Cli {
    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Parse `argv` and run the selected command.
    pub async fn dispatch(&self, argv: Vec<OsString>) -> Result<()> {
        let argv = expand_default_commands(&self.root, argv);
        let matches = match self.command.clone().try_get_matches_from(&argv) {
            Ok(matches) => matches,
            Err(error) => return self.report_parse_error(error),
        };

        let mut node = &self.root;
        let mut current = &matches;
        let mut path: Vec<String> = Vec::new();
        while let Some((name, sub_matches)) = current.subcommand() {
            if name == HELP_COMMAND && node.has_help_command {
                let mut target = path.clone();
                target.extend(help_target(sub_matches));
                let help = self.render_help(&target)?;
                return self.app.terminal().write_help(&help, false);
            }
            let Some(child) = node.children.get(name) else {
                break;
            };
            path.push(name.to_string());
            node = child;
            current = sub_matches;
        }

        match &node.action {
            Some(action) => {
                debug!(command = %action.command(), "dispatching");
                action.invoke(current).await
            }
            None if !path.is_empty() && node.children.is_empty() => {
                debug!(command = %path.join(" "), "command has no handler");
                Ok(())
            }
            None => {
                let help = self.render_help(&path)?;
                self.app.terminal().write_help(&help, true)?;
                Err(Error::MissingSubcommand {
                    path: if path.is_empty() {
                        self.app.name().to_string()
                    } else {
                        path.join(" ")
                    },
                })
            }
        }
    }

    /// Help text for the command at `path`.
    pub fn render_help(&self, path: &[String]) -> Result<String> {
        let mut argv: Vec<String> = Vec::with_capacity(path.len() + 2);
        argv.push(self.app.name().to_string());
        argv.extend(path.iter().cloned());
        argv.push("--help".to_string());

        match self.command.clone().try_get_matches_from(argv) {
            Err(error) if error.kind() == ErrorKind::DisplayHelp => Ok(error.to_string()),
            Err(error) => {
                self.app.terminal().write_error_text(&error.to_string())?;
                Err(Error::Usage(error))
            }
            Ok(_) => Ok(self.command.clone().render_help().to_string()),
        }
    }

    fn report_parse_error(&self, error: clap::Error) -> Result<()> {
        let terminal = self.app.terminal();
        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                terminal.write_help(&error.to_string(), false)
            }
            _ => {
                terminal.write_error_text(&error.to_string())?;
                Err(Error::Usage(error))
            }
        }
    }
}

/// Insert default subcommand names where a group is invoked without naming
/// a child. The default child wins over the group's own handler.
fn expand_default_commands(root: &CommandNode, argv: Vec<OsString>) -> Vec<OsString> {
    let mut tokens = argv.into_iter().peekable();
    let mut expanded: Vec<OsString> = tokens.next().into_iter().collect();
    let mut node = root;

    loop {
        let token = tokens
            .peek()
            .and_then(|token| token.to_str())
            .map(str::to_owned);

        if let Some(token) = token.as_deref() {
            if let Some(child) = node.child(token) {
                expanded.extend(tokens.next());
                node = child;
                continue;
            }
            let stops = matches!(token, "-h" | "--help" | "--")
                || (token == HELP_COMMAND && node.has_help_command)
                || (std::ptr::eq(node, root) && matches!(token, "-v" | "--version"));
            if stops {
                break;
            }
        }

        match node.default_child() {
            Some(default) => {
                debug!(group = %node.name, default = %default.name, "routing to default command");
                expanded.push(OsString::from(default.name.clone()));
                node = default;
            }
            None => break,
        }
    }

    expanded.extend(tokens);
    expanded
}
