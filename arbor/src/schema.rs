//! JSON Schema backed option and argument schemas.
//!
//! Options are described by an object schema whose `properties` are the
//! flags. Arguments are described by an array schema whose `prefixItems` are
//! the positional slots; an `items` schema marks a variadic tail.

use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, Validator};
use serde_json::{json, Map, Number, Value};
use tracing::trace;

use crate::error::{Error, Result};

/// Which CLI surface a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Options,
    Arguments,
}

/// One field of a schema, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    /// Property key for options, `None` for positional arguments.
    pub key: Option<&'a str>,
    /// Position among the fields.
    pub index: usize,
    /// The field's own schema. Variadic fields are always array schemas.
    pub schema: &'a Value,
    pub required: bool,
    pub variadic: bool,
}

/// The single issue reported when input fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    message: String,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_error(error: &jsonschema::ValidationError<'_>) -> Self {
        let path = display_path(&error.instance_path.to_string());
        if path.is_empty() {
            Self::new(error.to_string())
        } else {
            Self::new(format!("{error} at \"{path}\""))
        }
    }
}

/// A compiled options or arguments schema.
#[derive(Clone)]
pub struct Schema {
    kind: SchemaKind,
    raw: Value,
    rest: Option<Value>,
    validator: Arc<Validator>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .finish()
    }
}

impl Schema {
    /// Compile an options schema. It must describe an object.
    pub fn options(raw: Value) -> Result<Self> {
        require_type(&raw, "object")?;
        Self::compile(SchemaKind::Options, raw, None)
    }

    /// Compile an arguments schema. It must describe an array.
    ///
    /// A final `prefixItems` entry that is itself an array is moved into the
    /// `items` position, so both spellings of a variadic tail behave alike.
    pub fn arguments(raw: Value) -> Result<Self> {
        require_type(&raw, "array")?;
        let (raw, rest) = normalize_arguments(raw);
        Self::compile(SchemaKind::Arguments, raw, rest)
    }

    fn compile(kind: SchemaKind, raw: Value, rest: Option<Value>) -> Result<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&raw)
            .map_err(|e| Error::invalid_schema(e.to_string()))?;
        Ok(Self {
            kind,
            raw,
            rest,
            validator: Arc::new(validator),
        })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> Vec<Field<'_>> {
        match self.kind {
            SchemaKind::Options => self.option_fields(),
            SchemaKind::Arguments => self.argument_fields(),
        }
    }

    fn option_fields(&self) -> Vec<Field<'_>> {
        let required: Vec<&str> = self
            .raw
            .get("required")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        self.raw
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .enumerate()
                    .map(|(index, (key, schema))| Field {
                        key: Some(key.as_str()),
                        index,
                        schema,
                        required: required.contains(&key.as_str()),
                        variadic: false,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn argument_fields(&self) -> Vec<Field<'_>> {
        let min_items = self.min_items();
        let prefix = self.prefix_items();
        let mut fields: Vec<Field<'_>> = prefix
            .iter()
            .enumerate()
            .map(|(index, schema)| Field {
                key: None,
                index,
                schema,
                required: index < min_items,
                variadic: false,
            })
            .collect();

        if let Some(rest) = &self.rest {
            fields.push(Field {
                key: None,
                index: prefix.len(),
                schema: rest,
                required: min_items > prefix.len(),
                variadic: true,
            });
        }
        fields
    }

    fn prefix_items(&self) -> &[Value] {
        self.raw
            .get("prefixItems")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn min_items(&self) -> usize {
        self.raw
            .get("minItems")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(0)
    }

    /// Apply defaults, then validate `input`.
    ///
    /// Only the first issue is kept. The returned value is the input with
    /// defaults filled in.
    pub async fn safe_parse(&self, mut input: Value) -> std::result::Result<Value, ValidationFailure> {
        self.apply_defaults(&mut input);
        let failure = self
            .validator
            .iter_errors(&input)
            .next()
            .map(|error| ValidationFailure::from_error(&error));

        match failure {
            Some(failure) => {
                trace!(kind = ?self.kind, issue = failure.message(), "schema rejected input");
                Err(failure)
            }
            None => Ok(input),
        }
    }

    fn apply_defaults(&self, input: &mut Value) {
        match (self.kind, input) {
            (SchemaKind::Options, Value::Object(values)) => {
                let Some(properties) = self.raw.get("properties").and_then(Value::as_object) else {
                    return;
                };
                for (key, property) in properties {
                    if values.contains_key(key) {
                        continue;
                    }
                    if let Some(default) = property.get("default") {
                        values.insert(key.clone(), default.clone());
                    }
                }
            }
            (SchemaKind::Arguments, Value::Array(values)) => {
                for item in self.prefix_items().iter().skip(values.len()) {
                    match item.get("default") {
                        Some(default) => values.push(default.clone()),
                        None => break,
                    }
                }
            }
            _ => {}
        }
    }
}

fn require_type(raw: &Value, expected: &str) -> Result<()> {
    if !raw.is_object() {
        return Err(Error::invalid_schema(format!(
            "expected a schema object of type '{expected}'"
        )));
    }
    let types = declared_types(raw);
    if types.is_empty() || types.contains(&expected) {
        Ok(())
    } else {
        Err(Error::invalid_schema(format!(
            "expected type '{expected}', found '{}'",
            types.join(", ")
        )))
    }
}

fn normalize_arguments(mut raw: Value) -> (Value, Option<Value>) {
    let Some(schema) = raw.as_object_mut() else {
        return (raw, None);
    };

    let mut prefix = match schema.get("prefixItems").and_then(Value::as_array) {
        Some(prefix) => prefix.clone(),
        None => {
            // A plain array schema is one variadic argument.
            let rest = schema
                .get("items")
                .filter(|items| items.is_object())
                .map(|_| Value::Object(schema.clone()));
            return (raw, rest);
        }
    };

    if let Some(items) = schema.get("items").filter(|items| items.is_object()) {
        let rest = variadic_from_items(items);
        return (raw, Some(rest));
    }

    let trailing_array = prefix
        .last()
        .is_some_and(|last| declared_types(last).contains(&"array"));
    if !trailing_array {
        return (raw, None);
    }

    let Some(last) = prefix.pop() else {
        return (raw, None);
    };
    let fixed = prefix.len();
    let items = last.get("items").cloned().unwrap_or_else(|| json!({}));
    let tail_min = last.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;

    schema.insert("prefixItems".to_string(), Value::Array(prefix));
    schema.insert("items".to_string(), items);
    if tail_min > 0 {
        let current = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        schema.insert(
            "minItems".to_string(),
            Value::from(current.max(fixed + tail_min)),
        );
    }
    (raw, Some(last))
}

fn variadic_from_items(items: &Value) -> Value {
    let mut rest = Map::new();
    rest.insert("type".to_string(), json!("array"));
    rest.insert("items".to_string(), items.clone());
    for keyword in ["description", crate::field_config::CLI_KEYWORD] {
        if let Some(value) = items.get(keyword) {
            rest.insert(keyword.to_string(), value.clone());
        }
    }
    Value::Object(rest)
}

/// The `type` keyword of a field as a list.
pub(crate) fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Convert a raw command-line string into the JSON value its field declares.
///
/// Declared types are tried in order; a string that fits none of them is
/// passed through unchanged so the validator can report it.
pub(crate) fn coerce(raw: &str, schema: &Value) -> Value {
    for ty in declared_types(schema) {
        match ty {
            "string" => break,
            "integer" => {
                if let Ok(value) = raw.parse::<i64>() {
                    return Value::from(value);
                }
            }
            "number" => {
                if let Some(value) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
                    return Value::Number(value);
                }
            }
            "boolean" => match raw {
                "true" => return Value::Bool(true),
                "false" => return Value::Bool(false),
                _ => {}
            },
            _ => {}
        }
    }
    Value::String(raw.to_string())
}

/// Render a JSON pointer such as `/tags/1` as `tags[1]`.
fn display_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.parse::<usize>().is_ok() {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(&segment);
        }
    }
    path
}
