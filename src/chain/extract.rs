//! JMESPath extraction from JSON response bodies

use serde_json::Value;
use std::path::Path;

use super::annotations::Extraction;
use crate::errors::{ReqtreeError, Result};

/// Parses a response body declared to carry extractable values.
pub fn parse_body(path: &Path, body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| ReqtreeError::extraction(path, format!("response body is not valid JSON: {}", e)))
}

/// Evaluates one extraction and returns the value as it is stored in the session.
///
/// A `null` result is an error: extraction must produce a concrete value.
pub fn evaluate(path: &Path, data: &Value, extraction: &Extraction) -> Result<String> {
    let expression = jmespath::compile(&extraction.expression).map_err(|e| {
        ReqtreeError::extraction(
            path,
            format!("invalid JMESPath expression '{}': {}", extraction.expression, e),
        )
    })?;

    let found = expression.search(data).map_err(|e| {
        ReqtreeError::extraction(
            path,
            format!("cannot evaluate '{}': {}", extraction.expression, e),
        )
    })?;

    let value = serde_json::to_value(&*found)?;
    if value.is_null() {
        return Err(ReqtreeError::extraction(
            path,
            format!(
                "'{}' matched nothing for variable '{}'",
                extraction.expression, extraction.variable
            ),
        ));
    }

    Ok(stringify(&value))
}

/// Session form of a JSON value: strings as-is, numbers in their shortest
/// round-trip form, compound values as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else if let Some(f) = n.as_f64() {
                f.to_string()
            } else {
                n.to_string()
            }
        }
        compound => compound.to_string(),
    }
}
