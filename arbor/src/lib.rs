//! # Arbor
//!
//! Arbor turns a directory of command modules into a nested command-line
//! interface. Each module file becomes a command, each subdirectory a group
//! of commands, and an `index` module makes its directory runnable too.
//!
//! ```text
//! commands/
//! ├── _app.md          wraps the output of every command
//! ├── index.md         runs when the program is invoked bare
//! ├── build.md         `app build`
//! └── db/
//!     ├── index.md     `app db`
//!     └── migrate.md   `app db migrate`
//! ```
//!
//! A module declares its options and positional arguments as JSON Schema in
//! its frontmatter. Input is validated against those schemas before the
//! module's liquid template renders:
//!
//! ```markdown
//! ---
//! description: Build the project
//! options:
//!   type: object
//!   properties:
//!     target:
//!       type: string
//!       description: Target environment
//!   required: [target]
//! ---
//! Building for {{ options.target }}
//! ```
//!
//! ## Running a program
//!
//! ```no_run
//! use arbor::{Program, ProgramOptions};
//!
//! # async fn run() -> arbor::Result<()> {
//! let program = Program::new(ProgramOptions::new("commands").with_version("1.0.0"));
//! program.run(std::env::args_os()).await
//! # }
//! ```

pub mod app;
pub mod app_resolver;
pub mod command;
pub mod component;
pub mod conversion;
pub mod error;
pub mod extract;
pub mod field_config;
pub mod frontmatter;
pub mod invocation;
pub mod loader;
pub mod program;
pub mod registrar;
pub mod schema;
pub mod template;
pub mod terminal;
pub mod tree;

pub use app::App;
pub use app_resolver::read_custom_app;
pub use command::{Command, CommandMap, CommandModule};
pub use component::{
    AppComponent, CommandProps, Component, DefaultApp, FnComponent, TemplateApp,
    TemplateComponent,
};
pub use error::{Error, Result};
pub use extract::{extract_arguments, extract_options, ArgumentSpec, OptionArity, OptionSpec};
pub use field_config::{ArgumentConfig, OptionConfig};
pub use invocation::{Action, InvocationState};
pub use loader::{ComponentRegistry, MarkdownLoader, ModuleLoader};
pub use program::{Cli, Program, ProgramOptions};
pub use registrar::{register_command, register_commands, CommandNode, RegistrationContext};
pub use schema::{Schema, SchemaKind, ValidationFailure};
pub use terminal::{Capture, Terminal};
pub use tree::{command_name, read_commands};
