//! Fluent assertions over the latest JSON API response.
//!
//! Every assertion decodes the response body afresh, resolves a dotted path
//! and returns `Ok(&Self)` so calls chain with `?`:
//!
//! ```
//! use apiassert::{AssertionError, ResponseValidator, RuleSet, TestResponse};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), AssertionError> {
//! let response = TestResponse::json(200, &json!({"data": [{"id": 1, "active": true}]}));
//! ResponseValidator::new(&response)
//!     .see_status_code(200)?
//!     .see_collection(
//!         &RuleSet::new()
//!             .field("id", ["required", "integer"])
//!             .field("active", ["required", "strict_boolean"]),
//!     )?;
//! # Ok(())
//! # }
//! ```

mod pagination;

use serde_json::Value;
use tracing::debug;

use crate::domain::error::AssertionError;
use crate::domain::rules::RuleSet;
use crate::domain::value_path;
use crate::engine::schema;
use crate::engine::validate::{FieldValidator, RuleValidator};
use crate::response::ResponseSource;

pub use pagination::{CURRENT_PAGE_KEY, LAST_PAGE_KEY, PER_PAGE_KEY, TOTAL_KEY};

/// Path checked by [`ResponseValidator::see_collection`] unless overridden.
pub const DEFAULT_COLLECTION_KEY: &str = "data";

/// Label used for the whole response body in failure messages.
const ROOT_LABEL: &str = "$";

/// Assertion helper bound to one response for the lifetime of a test case.
#[derive(Debug, Clone)]
pub struct ResponseValidator<R, V = RuleValidator> {
    response: R,
    validator: V,
    collection_key: String,
    pagination_namespace: String,
}

impl<R: ResponseSource> ResponseValidator<R> {
    /// Uses a [`RuleValidator`] with the `not_present` and `strict_boolean`
    /// extensions registered.
    pub fn new(response: R) -> Self {
        Self::with_validator(response, RuleValidator::with_api_extensions())
    }
}

impl<R: ResponseSource, V: FieldValidator> ResponseValidator<R, V> {
    pub fn with_validator(response: R, validator: V) -> Self {
        Self {
            response,
            validator,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            pagination_namespace: String::new(),
        }
    }

    /// Overrides the path used by [`Self::see_collection`].
    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    pub fn response(&self) -> &R {
        &self.response
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Decodes the whole response body.
    pub fn response_json(&self) -> Result<Value, AssertionError> {
        serde_json::from_str(self.response.body())
            .map_err(|source| AssertionError::InvalidJson { source })
    }

    /// Returns the value at `path`, failing with `MissingKey` when absent.
    pub fn value_at_key(&self, path: &str) -> Result<Value, AssertionError> {
        let root = self.response_json()?;
        lookup(&root, path).cloned()
    }

    pub fn see_status_code(&self, expected: u16) -> Result<&Self, AssertionError> {
        let actual = self
            .response
            .status()
            .ok_or(AssertionError::StatusUnavailable)?;
        if actual != expected {
            debug!(expected, actual, "status code mismatch");
            return Err(AssertionError::StatusMismatch { expected, actual });
        }
        Ok(self)
    }

    /// Validates every record of the collection at the default key (`data`).
    pub fn see_collection(&self, rules: &RuleSet) -> Result<&Self, AssertionError> {
        self.see_collection_at(rules, &self.collection_key)
    }

    /// Validates every record of the sequence at `path`. The first failing
    /// record is reported with its index.
    pub fn see_collection_at(&self, rules: &RuleSet, path: &str) -> Result<&Self, AssertionError> {
        self.validator.check_rules(rules)?;
        let root = self.response_json()?;
        let collection = lookup(&root, path)?;

        let Value::Array(items) = collection else {
            debug!(path, found = json_type_name(collection), "collection not found");
            return Err(AssertionError::CollectionNotFound {
                path: path.to_string(),
                reason: format!("found {}", json_type_name(collection)),
            });
        };

        for (index, item) in items.iter().enumerate() {
            if !item.is_object() {
                return Err(AssertionError::CollectionNotFound {
                    path: path.to_string(),
                    reason: format!("element {index} is {}, not a record", json_type_name(item)),
                });
            }
            self.assert_valid_item(item, rules, &format!("{path}.{index}"))?;
        }

        debug!(path, records = items.len(), "collection matched rules");
        Ok(self)
    }

    /// Validates the whole response body as one record.
    pub fn see_item(&self, rules: &RuleSet) -> Result<&Self, AssertionError> {
        let root = self.response_json()?;
        self.assert_record(&root, rules, ROOT_LABEL)?;
        Ok(self)
    }

    /// Validates the record at `path`.
    pub fn see_item_at(&self, rules: &RuleSet, path: &str) -> Result<&Self, AssertionError> {
        let root = self.response_json()?;
        let item = lookup(&root, path)?;
        self.assert_record(item, rules, path)?;
        Ok(self)
    }

    /// Asserts that the value at `path` equals `expected`.
    ///
    /// Equality is strict on JSON types: `1` never equals `true` or `"1"`.
    /// Numbers compare by value, so `1` equals `1.0`.
    pub fn see_value_at_key(
        &self,
        path: &str,
        expected: impl Into<Value>,
    ) -> Result<&Self, AssertionError> {
        let expected = expected.into();
        let root = self.response_json()?;
        let actual = lookup(&root, path)?;

        if !json_equals(&expected, actual) {
            debug!(path, %expected, %actual, "value mismatch");
            return Err(AssertionError::ValueMismatch {
                path: path.to_string(),
                expected,
                actual: actual.clone(),
            });
        }
        Ok(self)
    }

    /// Validates the whole response body against a JSON Schema.
    pub fn see_json_schema(&self, schema: &Value) -> Result<&Self, AssertionError> {
        let root = self.response_json()?;
        assert_schema(&root, schema, ROOT_LABEL)?;
        Ok(self)
    }

    /// Validates the value at `path` against a JSON Schema.
    pub fn see_json_schema_at(&self, schema: &Value, path: &str) -> Result<&Self, AssertionError> {
        let root = self.response_json()?;
        let value = lookup(&root, path)?;
        assert_schema(value, schema, path)?;
        Ok(self)
    }

    fn assert_record(
        &self,
        record: &Value,
        rules: &RuleSet,
        location: &str,
    ) -> Result<(), AssertionError> {
        if !record.is_object() {
            return Err(AssertionError::NotARecord {
                path: location.to_string(),
                found: json_type_name(record),
            });
        }
        self.assert_valid_item(record, rules, location)
    }

    fn assert_valid_item(
        &self,
        record: &Value,
        rules: &RuleSet,
        location: &str,
    ) -> Result<(), AssertionError> {
        let errors = self.validator.validate(record, rules)?;
        if !errors.is_empty() {
            debug!(path = location, fields = errors.len(), "record failed validation");
            return Err(AssertionError::Validation {
                path: location.to_string(),
                errors,
            });
        }
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Result<&'a Value, AssertionError> {
    value_path::resolve_str(root, path).ok_or_else(|| {
        debug!(path, "key not found in response");
        AssertionError::MissingKey {
            path: path.to_string(),
        }
    })
}

fn assert_schema(value: &Value, schema: &Value, location: &str) -> Result<(), AssertionError> {
    let mismatches = schema::validate(value, schema)?;
    if !mismatches.is_empty() {
        return Err(AssertionError::SchemaMismatch {
            path: location.to_string(),
            mismatches,
        });
    }
    Ok(())
}

fn json_equals(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
                left == right
            } else if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
                left == right
            } else if left.is_f64() || right.is_f64() {
                left.as_f64() == right.as_f64()
            } else {
                false
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| json_equals(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right
                        .get(key)
                        .is_some_and(|right| json_equals(left, right))
                })
        }
        _ => expected == actual,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
