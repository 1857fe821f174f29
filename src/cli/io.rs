//! JSON I/O handling for CLI
//!
//! - Input: single JSON object via stdin
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::collections::HashMap;
use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&input)?;
    Ok(value)
}

/// Flatten a request object into string parameters.
///
/// Strings pass through, numbers are rendered in decimal and `null` drops
/// the key. Nested values are rejected.
pub fn request_params(request: &Value) -> CliResult<HashMap<String, String>> {
    let object = request
        .as_object()
        .ok_or_else(|| CliError::invalid_request("Request must be a JSON object"))?;

    let mut params = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(CliError::invalid_request(format!(
                    "Parameter {} must be a string or number",
                    key
                )))
            }
        };
        params.insert(key.clone(), text);
    }
    Ok(params)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params_flatten_scalars() {
        let params = request_params(&json!({
            "date": "2024-05-03",
            "num_results": 5,
            "older_than_ts": 1714700000,
            "filter": null
        }))
        .unwrap();

        assert_eq!(params["date"], "2024-05-03");
        assert_eq!(params["num_results"], "5");
        assert_eq!(params["older_than_ts"], "1714700000");
        assert!(!params.contains_key("filter"));
    }

    #[test]
    fn test_request_params_reject_nested() {
        assert!(request_params(&json!({"camera": ["a"]})).is_err());
        assert!(request_params(&json!("camera")).is_err());
    }
}
