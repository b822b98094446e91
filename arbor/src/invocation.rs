//! Validated invocation of a single command.
//!
//! An invocation moves `Received → ValidatingOptions → ValidatingArguments →
//! Rendering → Completed`. A validation failure ends it in `Aborted` with an
//! [`Error::Validation`] that the caller turns into an exit status.

use std::sync::Arc;

use clap::ArgMatches;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::app::App;
use crate::component::{AppComponent, CommandProps, Component};
use crate::conversion::{arguments_to_json, options_to_json};
use crate::error::{Error, Result};
use crate::extract::{ArgumentSpec, OptionSpec};
use crate::schema::{Schema, ValidationFailure};

/// Where an invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    ValidatingOptions,
    ValidatingArguments,
    Rendering,
    Completed,
    Aborted,
}

/// The handler bound to a runnable command.
pub struct Action {
    command: String,
    options: Option<Schema>,
    option_specs: Vec<OptionSpec>,
    args: Option<Schema>,
    argument_specs: Vec<ArgumentSpec>,
    component: Arc<dyn Component>,
    app_component: Arc<dyn AppComponent>,
    app: Arc<App>,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("command", &self.command)
            .field("options", &self.option_specs.len())
            .field("arguments", &self.argument_specs.len())
            .finish_non_exhaustive()
    }
}

impl Action {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        command: String,
        options: Option<Schema>,
        option_specs: Vec<OptionSpec>,
        args: Option<Schema>,
        argument_specs: Vec<ArgumentSpec>,
        component: Arc<dyn Component>,
        app_component: Arc<dyn AppComponent>,
        app: Arc<App>,
    ) -> Self {
        Self {
            command,
            options,
            option_specs,
            args,
            argument_specs,
            component,
            app_component,
            app,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the final positional consumes all remaining tokens.
    pub fn has_variadic_argument(&self) -> bool {
        self.argument_specs.iter().any(|spec| spec.variadic)
    }

    /// Run the command with the values clap matched.
    pub async fn invoke(&self, matches: &ArgMatches) -> Result<()> {
        let options = options_to_json(matches, &self.option_specs);
        let args = arguments_to_json(matches, &self.argument_specs);
        self.run(options, args).await
    }

    /// Validate raw input, render the command and write its output.
    pub async fn run(&self, raw_options: Map<String, Value>, raw_args: Vec<Value>) -> Result<()> {
        let mut state = InvocationState::Received;
        debug!(command = %self.command, ?state, "invocation received");

        let mut options = Map::new();
        if let Some(schema) = &self.options {
            state = self.transition(state, InvocationState::ValidatingOptions);
            match schema.safe_parse(Value::Object(raw_options)).await {
                Ok(Value::Object(parsed)) => options = parsed,
                Ok(other) => warn!(command = %self.command, value = %other, "options schema produced a non-object"),
                Err(failure) => return Err(self.abort(state, failure)),
            }
        }

        let mut args = Vec::new();
        if let Some(schema) = &self.args {
            state = self.transition(state, InvocationState::ValidatingArguments);
            debug!(
                command = %self.command,
                variadic = self.has_variadic_argument(),
                count = raw_args.len(),
                "validating arguments"
            );
            match schema.safe_parse(Value::Array(raw_args)).await {
                Ok(Value::Array(parsed)) => args = parsed,
                Ok(other) => args = vec![other],
                Err(failure) => return Err(self.abort(state, failure)),
            }
        }

        state = self.transition(state, InvocationState::Rendering);
        let props = CommandProps {
            options,
            args,
            app: Arc::clone(&self.app),
        };
        let frame = self
            .app_component
            .render(self.component.as_ref(), &props)
            .await?;
        self.app.terminal().write_frame(&frame)?;

        self.transition(state, InvocationState::Completed);
        Ok(())
    }

    fn transition(&self, from: InvocationState, to: InvocationState) -> InvocationState {
        debug!(command = %self.command, ?from, ?to, "invocation state change");
        to
    }

    fn abort(&self, state: InvocationState, failure: ValidationFailure) -> Error {
        self.transition(state, InvocationState::Aborted);
        if let Err(e) = self.app.terminal().status_error(failure.message()) {
            warn!(command = %self.command, "failed to report validation error: {e}");
        }
        Error::Validation(failure)
    }
}
