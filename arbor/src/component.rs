//! Rendering handlers bound to commands.
//!
//! A [`Component`] turns validated command input into output. An
//! [`AppComponent`] wraps every component of a program, which is how an
//! `_app` module decorates all commands at once.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::app::App;
use crate::error::Result;
use crate::template::Template;

/// Validated input for one command invocation.
#[derive(Debug, Clone)]
pub struct CommandProps {
    pub options: Map<String, Value>,
    pub args: Vec<Value>,
    pub app: Arc<App>,
}

impl CommandProps {
    /// Globals exposed to templates: `options`, `args` and `app`.
    pub fn to_globals(&self) -> Value {
        json!({
            "options": self.options,
            "args": self.args,
            "app": self.app.to_value(),
        })
    }
}

/// A command's rendering handler.
#[async_trait]
pub trait Component: Send + Sync {
    /// Produce the output frame for `props`.
    async fn render(&self, props: &CommandProps) -> Result<String>;
}

/// Wrapper rendered around every command component.
#[async_trait]
pub trait AppComponent: Send + Sync {
    async fn render(&self, component: &dyn Component, props: &CommandProps) -> Result<String>;
}

/// Renders the command component unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultApp;

#[async_trait]
impl AppComponent for DefaultApp {
    async fn render(&self, component: &dyn Component, props: &CommandProps) -> Result<String> {
        component.render(props).await
    }
}

/// A component backed by a liquid template.
#[derive(Debug, Clone)]
pub struct TemplateComponent {
    template: Template,
}

impl TemplateComponent {
    pub fn new(template: Template) -> Self {
        Self { template }
    }
}

#[async_trait]
impl Component for TemplateComponent {
    async fn render(&self, props: &CommandProps) -> Result<String> {
        self.template.render(&props.to_globals())
    }
}

/// An `_app` wrapper backed by a liquid template.
///
/// The wrapped command's output is available as `content`.
#[derive(Debug, Clone)]
pub struct TemplateApp {
    template: Template,
}

impl TemplateApp {
    pub fn new(template: Template) -> Self {
        Self { template }
    }
}

#[async_trait]
impl AppComponent for TemplateApp {
    async fn render(&self, component: &dyn Component, props: &CommandProps) -> Result<String> {
        let content = component.render(props).await?;
        let mut globals = props.to_globals();
        if let Value::Object(map) = &mut globals {
            map.insert("content".to_string(), Value::String(content));
        }
        self.template.render(&globals)
    }
}

/// Renders through a plain closure. Handy for embedding Rust handlers.
pub struct FnComponent<F> {
    render: F,
}

impl<F> FnComponent<F>
where
    F: Fn(&CommandProps) -> Result<String> + Send + Sync,
{
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> fmt::Debug for FnComponent<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnComponent")
    }
}

#[async_trait]
impl<F> Component for FnComponent<F>
where
    F: Fn(&CommandProps) -> Result<String> + Send + Sync,
{
    async fn render(&self, props: &CommandProps) -> Result<String> {
        (self.render)(props)
    }
}
