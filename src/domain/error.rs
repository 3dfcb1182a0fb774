use serde_json::Value;
use thiserror::Error;

use crate::domain::report::{FieldErrors, SchemaMismatch};
use crate::domain::value_path::ValuePathError;

/// Failures raised by response assertions.
#[derive(Debug, Error)]
pub enum AssertionError {
    /// The dotted path does not resolve to any value in the response.
    #[error("failed asserting that key `{path}` exists")]
    MissingKey { path: String },

    /// A sequence of records was required but something else was found.
    #[error("valid collection not found at key `{path}`: {reason}")]
    CollectionNotFound { path: String, reason: String },

    /// A single record was required but something else was found.
    #[error("value at `{path}` is {found}, not a record")]
    NotARecord { path: String, found: &'static str },

    /// A record failed one or more field rules.
    #[error("record at `{path}` failed validation:\n{errors}")]
    Validation { path: String, errors: FieldErrors },

    /// A resolved value differs from the expected literal.
    #[error("failed asserting that `{path}` equals {expected}, found {actual}")]
    ValueMismatch {
        path: String,
        expected: Value,
        actual: Value,
    },

    /// The response status code differs from the expected one.
    #[error("expected response status code {expected}, found {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("response source does not expose a status code")]
    StatusUnavailable,

    /// A value violates a JSON Schema.
    #[error("value at `{path}` does not match schema:\n{}", render_schema_mismatches(.mismatches))]
    SchemaMismatch {
        path: String,
        mismatches: Vec<SchemaMismatch>,
    },

    /// The JSON Schema itself could not be compiled.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// The response body is not JSON.
    #[error("response body is not valid json: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    /// The rule set could not be compiled by the validator.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Errors in a rule set, reported before any record is checked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule `{rule}` on field `{field}` is not registered with the validator")]
    UnknownRule { field: String, rule: String },

    #[error("rule `{rule}` on field `{field}` has an invalid parameter: {reason}")]
    InvalidParameter {
        field: String,
        rule: String,
        reason: String,
    },

    #[error("invalid rule path `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: ValuePathError,
    },

    #[error("rules for field `{field}` must be a list of strings or a pipe-delimited string")]
    InvalidDefinition { field: String },
}

fn render_schema_mismatches(mismatches: &[SchemaMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
