//! Helpers for reading provider-supplied function arguments.
//!
//! ```rust
//! use ctooling::{parse_json_object, required_string};
//!
//! let args = parse_json_object(r#"{"name":"Acme"}"#).expect("object should parse");
//! let name = required_string(&args, "name").expect("name should be present");
//! assert_eq!(name, "Acme");
//! ```

use cprovider::FunctionArguments;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::FunctionError;

/// Parses raw JSON text (as some providers emit it) into an argument map.
pub fn parse_json_object(args_json: &str) -> Result<FunctionArguments, FunctionError> {
    let value: Value = serde_json::from_str(args_json)
        .map_err(|err| FunctionError::invalid_arguments(format!("invalid JSON arguments: {err}")))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(FunctionError::invalid_arguments(
            "expected JSON object arguments",
        )),
    }
}

/// Deserializes the whole argument map into a typed struct.
pub fn parse_arguments<T>(args: &FunctionArguments) -> Result<T, FunctionError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::Object(args.clone()))?)
}

pub fn required_string(args: &FunctionArguments, key: &str) -> Result<String, FunctionError> {
    optional_string(args, key)
        .ok_or_else(|| FunctionError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &FunctionArguments, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
