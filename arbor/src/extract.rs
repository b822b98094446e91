//! Schema field extraction into CLI option and argument specifications.

use clap::{Arg, ArgAction};
use heck::ToKebabCase;
use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::field_config::{self, DEFAULT_ARGUMENT_NAME, DEFAULT_VALUE_DESCRIPTION};
use crate::schema::{declared_types, Schema};

/// How an option consumes command-line tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionArity {
    /// Presence sets `true`, never takes a value.
    Flag,
    /// Takes a value, or stands alone meaning `true`.
    OptionalValue,
    /// Always takes exactly one value.
    Value,
    /// Takes one value per occurrence and collects them.
    Repeated,
}

impl OptionArity {
    fn of(schema: &Value) -> Self {
        let types = declared_types(schema);
        let boolean = types.contains(&"boolean");
        if types.contains(&"array") {
            Self::Repeated
        } else if boolean && types.len() == 1 {
            Self::Flag
        } else if boolean {
            Self::OptionalValue
        } else {
            Self::Value
        }
    }
}

/// A CLI option derived from one options schema property.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    /// Property key, also the clap argument id.
    pub key: String,
    /// Long flag name without the leading dashes.
    pub long: String,
    pub alias: Option<String>,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub default_value_description: Option<String>,
    pub value_description: String,
    pub arity: OptionArity,
    pub required: bool,
    pub(crate) field: Value,
}

impl OptionSpec {
    /// Flag syntax as shown in help, e.g. `-t, --target <env>`.
    pub fn flags(&self) -> String {
        let mut flags = String::new();
        if let Some(alias) = &self.alias {
            if is_short(alias) {
                flags.push_str(&format!("-{alias}, "));
            } else {
                flags.push_str(&format!("--{alias}, "));
            }
        }
        flags.push_str("--");
        flags.push_str(&self.long);
        match self.arity {
            OptionArity::Flag => {}
            OptionArity::OptionalValue => flags.push_str(&format!(" [{}]", self.value_description)),
            OptionArity::Value => flags.push_str(&format!(" <{}>", self.value_description)),
            OptionArity::Repeated => flags.push_str(&format!(" <{}...>", self.value_description)),
        }
        flags
    }

    /// Help text, or `None` for a machine-only field.
    pub fn help(&self) -> Option<String> {
        help_text(
            self.description.as_deref(),
            self.default_value.as_ref(),
            self.default_value_description.as_deref(),
        )
    }

    /// Build the clap argument for this option.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.key.clone())
            .long(self.long.clone())
            .value_name(self.value_description.clone());

        if let Some(alias) = &self.alias {
            arg = match alias.chars().next() {
                Some(short) if is_short(alias) => arg.short(short),
                _ => arg.visible_alias(alias.clone()),
            };
        }

        arg = match self.arity {
            OptionArity::Flag => arg.action(ArgAction::SetTrue),
            OptionArity::OptionalValue => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .default_missing_value("true"),
            OptionArity::Value => arg.action(ArgAction::Set).num_args(1),
            OptionArity::Repeated => arg.action(ArgAction::Append).num_args(1),
        };

        match self.help() {
            Some(help) => arg.help(help),
            None => arg.hide(true),
        }
    }
}

/// A positional argument derived from one arguments schema item.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub default_value_description: Option<String>,
    pub required: bool,
    pub variadic: bool,
    pub(crate) field: Value,
}

impl ArgumentSpec {
    /// The clap argument id for the positional at `index`.
    pub fn id(index: usize) -> String {
        format!("@arg{index}")
    }

    /// Positional syntax, e.g. `<file>` or `[files...]`.
    pub fn syntax(&self) -> String {
        let ellipsis = if self.variadic { "..." } else { "" };
        if self.required {
            format!("<{}{ellipsis}>", self.name)
        } else {
            format!("[{}{ellipsis}]", self.name)
        }
    }

    pub fn help(&self) -> Option<String> {
        help_text(
            self.description.as_deref(),
            self.default_value.as_ref(),
            self.default_value_description.as_deref(),
        )
    }

    /// Build the clap positional for slot `index`.
    ///
    /// Presence is enforced by the schema rather than by clap so a missing
    /// argument reports like any other validation issue.
    pub fn to_arg(&self, index: usize) -> Arg {
        let mut arg = Arg::new(Self::id(index))
            .value_name(self.name.clone())
            .required(false);
        arg = if self.variadic {
            arg.action(ArgAction::Append).num_args(0..)
        } else {
            arg.action(ArgAction::Set).num_args(1)
        };
        match self.help() {
            Some(help) => arg.help(help),
            None => arg.hide(true),
        }
    }
}

/// Extract one option per property of an options schema.
pub fn extract_options(schema: &Schema) -> Result<Vec<OptionSpec>> {
    schema
        .fields()
        .into_iter()
        .map(|field| {
            let key = field.key.unwrap_or_default();
            let config = field_config::option_config(key, field.schema)?;
            let default_value = field.schema.get("default").cloned();
            let spec = OptionSpec {
                key: key.to_string(),
                long: key.to_kebab_case(),
                alias: config
                    .alias
                    .map(|alias| alias.trim_start_matches('-').to_string())
                    .filter(|alias| !alias.is_empty()),
                description: config.description,
                required: field.required && default_value.is_none(),
                default_value,
                default_value_description: config.default_value_description,
                value_description: config
                    .value_description
                    .unwrap_or_else(|| DEFAULT_VALUE_DESCRIPTION.to_string()),
                arity: OptionArity::of(field.schema),
                field: field.schema.clone(),
            };
            trace!(key, flags = %spec.flags(), "extracted option");
            Ok(spec)
        })
        .collect()
}

/// Extract one positional per item of an arguments schema.
pub fn extract_arguments(schema: &Schema) -> Result<Vec<ArgumentSpec>> {
    schema
        .fields()
        .into_iter()
        .map(|field| {
            let label = field.index.to_string();
            let mut config = field_config::argument_config(&label, field.schema)?;
            if field.variadic && config.description.is_none() {
                if let Some(items) = field.schema.get("items") {
                    config.description = field_config::argument_config(&label, items)?.description;
                }
            }
            let spec = ArgumentSpec {
                name: config
                    .name
                    .unwrap_or_else(|| DEFAULT_ARGUMENT_NAME.to_string()),
                description: config.description,
                default_value: field.schema.get("default").cloned(),
                default_value_description: config.default_value_description,
                required: field.required,
                variadic: field.variadic,
                field: field.schema.clone(),
            };
            trace!(index = field.index, syntax = %spec.syntax(), "extracted argument");
            Ok(spec)
        })
        .collect()
}

fn is_short(alias: &str) -> bool {
    alias.chars().count() == 1
}

fn help_text(
    description: Option<&str>,
    default: Option<&Value>,
    default_description: Option<&str>,
) -> Option<String> {
    let description = description?;
    let help = match (default_description, default) {
        (Some(shown), _) => format!("{description} (default: {shown})"),
        (None, Some(value)) => format!("{description} (default: {value})"),
        (None, None) => description.to_string(),
    };
    Some(help)
}
