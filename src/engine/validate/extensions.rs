use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub const NOT_PRESENT: &str = "not_present";
pub const STRICT_BOOLEAN: &str = "strict_boolean";

/// Predicate over the field value; `None` means the field is absent.
pub type Predicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Custom rule registered on a [`super::RuleValidator`].
#[derive(Clone)]
pub struct Extension {
    name: String,
    message: String,
    implicit: bool,
    predicate: Predicate,
}

impl Extension {
    /// `message` may contain `:attribute`, replaced with the field path.
    pub fn new<F>(name: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            implicit: false,
            predicate: Arc::new(predicate),
        }
    }

    /// Marks the rule as implicit: it runs even when the field is absent,
    /// null or an empty string.
    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn passes(&self, value: Option<&Value>) -> bool {
        (self.predicate)(value)
    }

    pub fn message(&self, field: &str) -> String {
        self.message.replace(":attribute", field)
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("implicit", &self.implicit)
            .finish_non_exhaustive()
    }
}

/// Passes only when the field is absent or null. Empty strings and `0` fail.
pub fn not_present() -> Extension {
    Extension::new(
        NOT_PRESENT,
        "The :attribute field must not be present.",
        |value| value.is_none_or(Value::is_null),
    )
    .implicit()
}

/// Passes only for JSON `true`/`false`; `0`, `1` and `"true"` fail.
pub fn strict_boolean() -> Extension {
    Extension::new(
        STRICT_BOOLEAN,
        "The :attribute field must be a strict boolean.",
        |value| value.is_some_and(Value::is_boolean),
    )
    .implicit()
}
