//! CLI metadata attached to schema fields.
//!
//! JSON Schema has no slot for flag aliases or value placeholders, so a field
//! carries them either in an `x-cli` keyword or, for schemas authored
//! elsewhere, as a JSON object smuggled into its `description` behind a
//! reserved prefix:
//!
//! ```text
//! __arbor_option_config__{"description":"Build target","alias":"t"}
//! ```
//!
//! A prefixed description is never shown to users verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Reserved description prefix for option metadata.
pub const OPTION_CONFIG_PREFIX: &str = "__arbor_option_config__";

/// Reserved description prefix for positional argument metadata.
pub const ARGUMENT_CONFIG_PREFIX: &str = "__arbor_argument_config__";

/// Schema keyword carrying the same metadata as a structured object.
pub const CLI_KEYWORD: &str = "x-cli";

/// Placeholder shown for an option value when none is configured.
pub const DEFAULT_VALUE_DESCRIPTION: &str = "value";

/// Display name for a positional argument when none is configured.
pub const DEFAULT_ARGUMENT_NAME: &str = "arg";

/// Metadata for an option flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Metadata for a positional argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value_description: Option<String>,
}

/// Encode option metadata as a prefixed description string.
pub fn option(config: &OptionConfig) -> String {
    encode(OPTION_CONFIG_PREFIX, config)
}

/// Encode argument metadata as a prefixed description string.
pub fn argument(config: &ArgumentConfig) -> String {
    encode(ARGUMENT_CONFIG_PREFIX, config)
}

fn encode<T: Serialize>(prefix: &str, config: &T) -> String {
    let payload = serde_json::to_string(config).unwrap_or_else(|_| String::from("{}"));
    format!("{prefix}{payload}")
}

/// Returns the JSON payload when `raw` carries a reserved prefix.
pub fn embedded_payload(raw: &str) -> Option<&str> {
    raw.strip_prefix(OPTION_CONFIG_PREFIX)
        .or_else(|| raw.strip_prefix(ARGUMENT_CONFIG_PREFIX))
}

trait Described {
    fn description(&self) -> Option<&str>;
    fn set_description(&mut self, description: String);
}

impl Described for OptionConfig {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }
}

impl Described for ArgumentConfig {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: String) {
        self.description = Some(description);
    }
}

/// Resolve option metadata for the field `key` from its schema.
pub fn option_config(key: &str, schema: &Value) -> Result<OptionConfig> {
    resolve(key, schema)
}

/// Resolve argument metadata for the positional field `field` from its schema.
pub fn argument_config(field: &str, schema: &Value) -> Result<ArgumentConfig> {
    resolve(field, schema)
}

fn resolve<T>(field: &str, schema: &Value) -> Result<T>
where
    T: DeserializeOwned + Default + Described,
{
    let raw = schema.get("description").and_then(Value::as_str);

    if let Some(cli) = schema.get(CLI_KEYWORD) {
        let mut config: T = serde_json::from_value(cli.clone())
            .map_err(|e| Error::field_config(field, e))?;
        if config.description().is_none() {
            if let Some(plain) = raw.filter(|raw| embedded_payload(raw).is_none()) {
                config.set_description(plain.to_string());
            }
        }
        return Ok(config);
    }

    match raw {
        Some(raw) => match embedded_payload(raw) {
            Some(payload) => {
                serde_json::from_str(payload).map_err(|e| Error::field_config(field, e))
            }
            None => {
                let mut config = T::default();
                config.set_description(raw.to_string());
                Ok(config)
            }
        },
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefixed_description_is_decoded() {
        let schema = json!({
            "type": "string",
            "description": option(&OptionConfig {
                description: Some("Build target".into()),
                alias: Some("t".into()),
                value_description: Some("env".into()),
                default_value_description: None,
            }),
        });

        let config = option_config("target", &schema).unwrap();
        assert_eq!(config.description.as_deref(), Some("Build target"));
        assert_eq!(config.alias.as_deref(), Some("t"));
        assert_eq!(config.value_description.as_deref(), Some("env"));
    }

    #[test]
    fn test_plain_description_has_no_overrides() {
        let schema = json!({"type": "string", "description": "Build target"});
        let config = option_config("target", &schema).unwrap();
        assert_eq!(
            config,
            OptionConfig {
                description: Some("Build target".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_missing_description() {
        let config = argument_config("0", &json!({"type": "string"})).unwrap();
        assert_eq!(config, ArgumentConfig::default());
    }

    #[test]
    fn test_cli_keyword_takes_precedence() {
        let schema = json!({
            "type": "string",
            "description": "Where to deploy",
            "x-cli": {"alias": "e", "valueDescription": "env"}
        });
        let config = option_config("environment", &schema).unwrap();
        assert_eq!(config.alias.as_deref(), Some("e"));
        assert_eq!(config.description.as_deref(), Some("Where to deploy"));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let schema = json!({"description": format!("{OPTION_CONFIG_PREFIX}{{not json")});
        let error = option_config("target", &schema).unwrap_err();
        assert!(matches!(error, Error::FieldConfig { ref field, .. } if field == "target"));
    }

    #[test]
    fn test_argument_wire_format() {
        let encoded = argument(&ArgumentConfig {
            name: Some("file".into()),
            ..Default::default()
        });
        assert_eq!(encoded, r#"__arbor_argument_config__{"name":"file"}"#);
        assert_eq!(embedded_payload(&encoded), Some(r#"{"name":"file"}"#));
    }
}
