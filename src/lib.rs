//! Declarative assertions for JSON HTTP API responses.
//!
//! A [`ResponseValidator`] wraps the latest response of an HTTP test client
//! and checks it against [`RuleSet`]s: per-field rule lists evaluated by a
//! [`FieldValidator`], dotted-path value lookups and pagination metadata.

pub mod assertions;
pub mod domain;
pub mod engine;
pub mod io;
pub mod response;

pub use assertions::ResponseValidator;
pub use domain::error::{AssertionError, RuleError};
pub use domain::report::FieldErrors;
pub use domain::rules::{RuleSet, RuleSpec};
pub use engine::validate::{Extension, FieldValidator, RuleValidator};
pub use response::{ResponseSource, TestResponse};
