//! Loading command modules from files.
//!
//! The tree builder never reads module files itself. It asks a
//! [`ModuleLoader`] whether a file is a module and what it provides, so the
//! on-disk format can be swapped without touching discovery.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::command::CommandModule;
use crate::component::{AppComponent, Component, TemplateApp, TemplateComponent};
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::schema::Schema;
use crate::template::TemplateEngine;

/// Source of command modules.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// The module name of `file_name` with its extension removed, or `None`
    /// when the file is not a loadable module.
    fn module_stem<'a>(&self, file_name: &'a str) -> Option<&'a str>;

    /// Load the command module at `path`.
    async fn load(&self, path: &Path) -> Result<CommandModule>;

    /// Load an `_app` wrapper module. `None` when the module has no wrapper.
    async fn load_app(&self, path: &Path) -> Result<Option<Arc<dyn AppComponent>>>;
}

/// Named Rust components that modules can reference with `component: <name>`.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.components.keys()).finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, component: Arc<dyn Component>) {
        self.components.insert(name.into(), component);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.get(name).cloned()
    }
}

/// Module file extensions, longest first so compound extensions win.
const MODULE_EXTENSIONS: &[&str] = &[
    ".markdown.liquid",
    ".md.liquid",
    ".liquid.md",
    ".markdown",
    ".liquid",
    ".yaml",
    ".yml",
    ".md",
];

/// Stem suffix of declaration-only files, which are never commands.
const DECLARATION_SUFFIX: &str = ".d";

/// Frontmatter of a command module.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleManifest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "is_default")]
    is_default: bool,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    options: Option<Value>,
    #[serde(default)]
    args: Option<Value>,
    #[serde(default)]
    component: Option<String>,
    #[serde(default)]
    template: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Loads markdown and YAML command modules.
///
/// Markdown modules carry their metadata as YAML frontmatter and their
/// liquid template as the body. YAML modules are all metadata, with the
/// template under a `template` key.
#[derive(Debug, Clone, Default)]
pub struct MarkdownLoader {
    components: ComponentRegistry,
}

impl MarkdownLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(components: ComponentRegistry) -> Self {
        Self { components }
    }

    async fn read_manifest(&self, path: &Path) -> Result<(ModuleManifest, Option<String>)> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(path, e))?;

        if is_yaml(path) {
            let mut manifest = parse_yaml(path, &content)?;
            let body = manifest.template.take();
            return Ok((manifest, body));
        }

        let parts = frontmatter::split(&content);
        let mut manifest = match parts.yaml {
            Some(yaml) => parse_yaml(path, yaml)?,
            None => ModuleManifest::default(),
        };
        let body = if parts.body.trim().is_empty() {
            manifest.template.take()
        } else {
            Some(parts.body.to_string())
        };
        Ok((manifest, body))
    }

    fn resolve_component(
        &self,
        path: &Path,
        name: Option<&str>,
        body: Option<&str>,
        engine: &TemplateEngine,
    ) -> Result<Option<Arc<dyn Component>>> {
        if let Some(name) = name {
            return self
                .components
                .get(name)
                .map(Some)
                .ok_or_else(|| Error::UnknownComponent {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                });
        }

        match body {
            Some(body) => {
                let template = engine.parse(body).map_err(|e| Error::module(path, e))?;
                Ok(Some(Arc::new(TemplateComponent::new(template))))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ModuleLoader for MarkdownLoader {
    fn module_stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = MODULE_EXTENSIONS
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))?;
        if stem.is_empty() || stem.ends_with(DECLARATION_SUFFIX) {
            return None;
        }
        Some(stem)
    }

    async fn load(&self, path: &Path) -> Result<CommandModule> {
        let (manifest, body) = self.read_manifest(path).await?;
        let engine = TemplateEngine::new()?;

        let options = manifest
            .options
            .map(Schema::options)
            .transpose()
            .map_err(|e| Error::module(path, e))?;
        let args = manifest
            .args
            .map(Schema::arguments)
            .transpose()
            .map_err(|e| Error::module(path, e))?;
        let component =
            self.resolve_component(path, manifest.component.as_deref(), body.as_deref(), &engine)?;

        debug!(
            path = %path.display(),
            runnable = component.is_some(),
            "loaded command module"
        );
        if !manifest.extra.is_empty() {
            trace!(keys = ?manifest.extra.keys().collect::<Vec<_>>(), "passing through extra module keys");
        }

        Ok(CommandModule {
            description: manifest.description,
            is_default: manifest.is_default,
            alias: manifest.alias,
            options,
            args,
            component,
            extra: manifest.extra,
        })
    }

    async fn load_app(&self, path: &Path) -> Result<Option<Arc<dyn AppComponent>>> {
        let (_, body) = self.read_manifest(path).await?;
        let Some(body) = body else {
            return Ok(None);
        };
        let template = TemplateEngine::new()?
            .parse(&body)
            .map_err(|e| Error::module(path, e))?;
        debug!(path = %path.display(), "loaded custom app wrapper");
        Ok(Some(Arc::new(TemplateApp::new(template))))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn parse_yaml(path: &Path, yaml: &str) -> Result<ModuleManifest> {
    if yaml.trim().is_empty() {
        return Ok(ModuleManifest::default());
    }
    serde_yaml_ng::from_str(yaml)
        .map_err(|e| Error::module(path, format!("invalid frontmatter: {e}")))
}
