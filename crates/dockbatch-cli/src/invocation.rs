use crate::error::{CliError, Result};
use dockbatch::core::models::config::RawRunConfig;
use serde_json::Value;
use tracing::debug;

/// Turns the positional JSON argument into run configurations.
///
/// The payload is either a single object or a non-empty array of objects;
/// configurations keep the order in which they appear.
pub fn parse_run_configs(payload: &str) -> Result<Vec<RawRunConfig>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| CliError::Invocation(format!("Error parsing JSON config: {}", e)))?;

    let configs = match value {
        Value::Object(_) => vec![parse_one(value, None)?],
        Value::Array(items) if items.is_empty() => {
            return Err(CliError::Invocation(
                "the configuration array is empty".to_string(),
            ));
        }
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_one(item, Some(i + 1)))
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(CliError::Invocation(format!(
                "expected a JSON object or an array of objects, found {}",
                json_kind(&other)
            )));
        }
    };

    debug!("Parsed {} run configuration(s).", configs.len());
    Ok(configs)
}

fn parse_one(value: Value, position: Option<usize>) -> Result<RawRunConfig> {
    let kind = json_kind(&value);
    if !value.is_object() {
        return Err(CliError::Invocation(match position {
            Some(i) => format!("configuration #{} must be an object, found {}", i, kind),
            None => format!("expected a JSON object, found {}", kind),
        }));
    }
    serde_json::from_value(value).map_err(|e| {
        CliError::Invocation(match position {
            Some(i) => format!("configuration #{}: {}", i, e),
            None => format!("Error parsing JSON config: {}", e),
        })
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
