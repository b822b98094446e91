//! Liquid templates backing markdown command modules.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};

/// Parser for command and `_app` templates.
pub struct TemplateEngine {
    parser: liquid::Parser,
}

impl TemplateEngine {
    /// Create an engine with the liquid standard library of tags and filters.
    pub fn new() -> Result<Self> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse `source` into a reusable template.
    pub fn parse(&self, source: &str) -> Result<Template> {
        let compiled = self
            .parser
            .parse(source)
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(Template {
            source: source.to_string(),
            compiled: Arc::new(compiled),
        })
    }
}

/// A parsed template together with its source text.
#[derive(Clone)]
pub struct Template {
    source: String,
    compiled: Arc<liquid::Template>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source)
            .finish()
    }
}

impl Template {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with `globals`, which must serialize to an object.
    pub fn render(&self, globals: &Value) -> Result<String> {
        let globals = liquid::to_object(globals).map_err(|e| Error::Render(e.to_string()))?;
        self.compiled
            .render(&globals)
            .map_err(|e| Error::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_with_nested_globals() {
        let engine = TemplateEngine::new().unwrap();
        let template = engine
            .parse("Deploying {{ options.target }} with {{ args | size }} args")
            .unwrap();
        let output = template
            .render(&json!({"options": {"target": "prod"}, "args": ["a", "b"]}))
            .unwrap();
        assert_eq!(output, "Deploying prod with 2 args");
    }

    #[test]
    fn test_parse_error() {
        let engine = TemplateEngine::new().unwrap();
        let error = engine.parse("{% if %}").unwrap_err();
        assert!(matches!(error, Error::Template(_)));
    }

    #[test]
    fn test_source_is_kept() {
        let engine = TemplateEngine::new().unwrap();
        let template = engine.parse("hello").unwrap();
        assert_eq!(template.source(), "hello");
    }
}
