use jsonschema::validator_for;
use serde_json::Value;

use crate::domain::error::AssertionError;
use crate::domain::report::SchemaMismatch;

/// Validates `value` against `schema`, returning every violation sorted by
/// dotted instance path.
pub fn validate(value: &Value, schema: &Value) -> Result<Vec<SchemaMismatch>, AssertionError> {
    let validator = validator_for(schema).map_err(|error| AssertionError::InvalidSchema {
        message: error.to_string(),
    })?;

    let mut mismatches: Vec<SchemaMismatch> = validator
        .iter_errors(value)
        .map(|error| {
            let instance_pointer = error.instance_path().as_str().to_string();
            SchemaMismatch {
                path: dotted_path_from_json_pointer(&instance_pointer),
                schema_path: error.schema_path().as_str().to_string(),
                message: error.to_string(),
                actual: value_at_pointer(value, &instance_pointer),
            }
        })
        .collect();

    mismatches.sort_by(|left, right| {
        (&left.path, &left.schema_path, &left.message).cmp(&(
            &right.path,
            &right.schema_path,
            &right.message,
        ))
    });

    Ok(mismatches)
}

fn value_at_pointer(root: &Value, pointer: &str) -> Value {
    if pointer.is_empty() {
        return root.clone();
    }
    root.pointer(pointer).cloned().unwrap_or(Value::Null)
}

/// `/data/0/id` → `data.0.id`; the document root is rendered as `$`.
fn dotted_path_from_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        return "$".to_string();
    }

    pointer
        .trim_start_matches('/')
        .split('/')
        .map(decode_pointer_token)
        .collect::<Vec<_>>()
        .join(".")
}

fn decode_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
