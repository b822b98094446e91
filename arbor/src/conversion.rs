//! Conversion from clap matches back into JSON schema input.
//!
//! Values are only coerced here. Missing required fields and type mismatches
//! are left for the schema to report, so every input problem surfaces the
//! same way.

use clap::ArgMatches;
use serde_json::{Map, Value};

use crate::extract::{ArgumentSpec, OptionArity, OptionSpec};
use crate::schema::coerce;

/// Collect the options present in `matches` into a JSON object.
///
/// Absent options are omitted so schema defaults can apply.
pub fn options_to_json(matches: &ArgMatches, specs: &[OptionSpec]) -> Map<String, Value> {
    let mut options = Map::new();
    for spec in specs {
        if let Some(value) = extract_option(matches, spec) {
            options.insert(spec.key.clone(), value);
        }
    }
    options
}

fn extract_option(matches: &ArgMatches, spec: &OptionSpec) -> Option<Value> {
    let id = spec.key.as_str();
    match spec.arity {
        OptionArity::Flag => matches.get_flag(id).then_some(Value::Bool(true)),
        OptionArity::Value => matches
            .get_one::<String>(id)
            .map(|raw| coerce(raw, &spec.field)),
        OptionArity::OptionalValue => match matches.get_one::<String>(id) {
            Some(raw) => Some(coerce(raw, &spec.field)),
            None if matches.contains_id(id) => Some(Value::Bool(true)),
            None => None,
        },
        OptionArity::Repeated => {
            let items = item_schema(&spec.field);
            matches.get_many::<String>(id).map(|values| {
                Value::Array(values.map(|raw| coerce(raw, &items)).collect())
            })
        }
    }
}

/// Collect positional values in declaration order.
///
/// A variadic tail is flattened into the same sequence.
pub fn arguments_to_json(matches: &ArgMatches, specs: &[ArgumentSpec]) -> Vec<Value> {
    let mut args = Vec::new();
    for (index, spec) in specs.iter().enumerate() {
        let id = ArgumentSpec::id(index);
        if spec.variadic {
            let items = item_schema(&spec.field);
            if let Some(values) = matches.get_many::<String>(&id) {
                args.extend(values.map(|raw| coerce(raw, &items)));
            }
        } else {
            match matches.get_one::<String>(&id) {
                Some(raw) => args.push(coerce(raw, &spec.field)),
                None => break,
            }
        }
    }
    args
}

fn item_schema(field: &Value) -> Value {
    field.get("items").cloned().unwrap_or(Value::Null)
}
