mod builtin;
pub mod extensions;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::domain::error::RuleError;
use crate::domain::report::FieldErrors;
use crate::domain::rules::{RuleSet, RuleSpec};
use crate::domain::value_path::{self, DottedPath};

use builtin::Builtin;
pub use extensions::{Extension, Predicate};

/// Checks one record against a rule set.
pub trait FieldValidator {
    /// Returns the per-field errors for `record`, empty when every rule
    /// passes. Rule set problems are reported before any field is checked.
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError>;

    /// Checks that every rule in `rules` can be evaluated, without a record.
    fn check_rules(&self, _rules: &RuleSet) -> Result<(), RuleError> {
        Ok(())
    }
}

impl<V: FieldValidator + ?Sized> FieldValidator for &V {
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError> {
        (**self).validate(record, rules)
    }

    fn check_rules(&self, rules: &RuleSet) -> Result<(), RuleError> {
        (**self).check_rules(rules)
    }
}

impl<V: FieldValidator + ?Sized> FieldValidator for Arc<V> {
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError> {
        (**self).validate(record, rules)
    }

    fn check_rules(&self, rules: &RuleSet) -> Result<(), RuleError> {
        (**self).check_rules(rules)
    }
}

impl<V: FieldValidator + ?Sized> FieldValidator for Box<V> {
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError> {
        (**self).validate(record, rules)
    }

    fn check_rules(&self, rules: &RuleSet) -> Result<(), RuleError> {
        (**self).check_rules(rules)
    }
}

/// Rule-based field validator with builtin rules and registered extensions.
///
/// Extensions are looked up before builtins, so a registered rule replaces
/// a builtin of the same name.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    extensions: BTreeMap<String, Extension>,
}

impl RuleValidator {
    /// Validator with builtin rules only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with the `not_present` and `strict_boolean` predicates used
    /// by API response assertions.
    pub fn with_api_extensions() -> Self {
        Self::builder()
            .extension(extensions::not_present())
            .extension(extensions::strict_boolean())
            .build()
    }

    pub fn builder() -> RuleValidatorBuilder {
        RuleValidatorBuilder::default()
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    fn compile<'a>(&'a self, rules: &'a RuleSet) -> Result<Vec<CompiledField<'a>>, RuleError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for field in rules.fields() {
            let path =
                DottedPath::parse(&field.path).map_err(|source| RuleError::InvalidPath {
                    path: field.path.clone(),
                    source,
                })?;

            let mut compiled_rules = Vec::with_capacity(field.rules.len());
            for spec in &field.rules {
                compiled_rules.push(self.compile_rule(&field.path, spec)?);
            }
            compiled.push(CompiledField::new(path, compiled_rules));
        }
        Ok(compiled)
    }

    fn compile_rule<'a>(
        &'a self,
        field: &str,
        spec: &'a RuleSpec,
    ) -> Result<CompiledRule<'a>, RuleError> {
        if let Some(extension) = self.extensions.get(spec.name()) {
            return Ok(CompiledRule {
                spec,
                kind: RuleKind::Extension(extension),
            });
        }

        match Builtin::compile(field, spec)? {
            Some(builtin) => Ok(CompiledRule {
                spec,
                kind: RuleKind::Builtin(builtin),
            }),
            None => Err(RuleError::UnknownRule {
                field: field.to_string(),
                rule: spec.name().to_string(),
            }),
        }
    }
}

impl FieldValidator for RuleValidator {
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError> {
        let fields = self.compile(rules)?;
        let mut errors = FieldErrors::new();

        for field in &fields {
            for concrete in value_path::expand(record, &field.path) {
                let value = value_path::resolve(record, &concrete);
                if field.sometimes && value.is_none() {
                    continue;
                }

                for rule in &field.rules {
                    if rule.is_marker() {
                        continue;
                    }
                    if !rule.is_implicit() && !is_validatable(value, field.nullable) {
                        continue;
                    }
                    if rule.passes(value, field.numeric) {
                        continue;
                    }

                    trace!(field = %concrete, rule = %rule.spec, "field rule failed");
                    errors.add(
                        concrete.as_str(),
                        rule.message(concrete.as_str(), value, field.numeric),
                    );
                    if field.bail || rule.is_implicit() {
                        break;
                    }
                }
            }
        }

        Ok(errors)
    }

    fn check_rules(&self, rules: &RuleSet) -> Result<(), RuleError> {
        self.compile(rules).map(|_| ())
    }
}

/// Explicit setup for a [`RuleValidator`].
#[derive(Debug, Default)]
pub struct RuleValidatorBuilder {
    extensions: BTreeMap<String, Extension>,
}

impl RuleValidatorBuilder {
    pub fn extension(mut self, extension: Extension) -> Self {
        self.extensions
            .insert(extension.name().to_string(), extension);
        self
    }

    /// Registers a rule that only runs when the field holds a non-empty value.
    pub fn extend<F>(self, name: &str, message: &str, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.extension(Extension::new(name, message, predicate))
    }

    /// Registers a rule that runs even when the field is absent or empty.
    pub fn extend_implicit<F>(self, name: &str, message: &str, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.extension(Extension::new(name, message, predicate).implicit())
    }

    pub fn build(self) -> RuleValidator {
        RuleValidator {
            extensions: self.extensions,
        }
    }
}

struct CompiledField<'a> {
    path: DottedPath,
    rules: Vec<CompiledRule<'a>>,
    bail: bool,
    nullable: bool,
    sometimes: bool,
    numeric: bool,
}

impl<'a> CompiledField<'a> {
    fn new(path: DottedPath, rules: Vec<CompiledRule<'a>>) -> Self {
        let has = |wanted: fn(&Builtin) -> bool| {
            rules.iter().any(|rule| match &rule.kind {
                RuleKind::Builtin(builtin) => wanted(builtin),
                RuleKind::Extension(_) => false,
            })
        };
        let bail = has(|rule| matches!(rule, Builtin::Bail));
        let nullable = has(|rule| matches!(rule, Builtin::Nullable));
        let sometimes = has(|rule| matches!(rule, Builtin::Sometimes));
        let numeric = has(Builtin::is_numeric_type);

        Self {
            path,
            rules,
            bail,
            nullable,
            sometimes,
            numeric,
        }
    }
}

struct CompiledRule<'a> {
    spec: &'a RuleSpec,
    kind: RuleKind<'a>,
}

enum RuleKind<'a> {
    Builtin(Builtin),
    Extension(&'a Extension),
}

impl CompiledRule<'_> {
    fn is_marker(&self) -> bool {
        match &self.kind {
            RuleKind::Builtin(builtin) => builtin.is_marker(),
            RuleKind::Extension(_) => false,
        }
    }

    fn is_implicit(&self) -> bool {
        match &self.kind {
            RuleKind::Builtin(builtin) => builtin.is_implicit(),
            RuleKind::Extension(extension) => extension.is_implicit(),
        }
    }

    fn passes(&self, value: Option<&Value>, numeric: bool) -> bool {
        match &self.kind {
            RuleKind::Builtin(builtin) => builtin.passes(value, numeric),
            RuleKind::Extension(extension) => extension.passes(value),
        }
    }

    fn message(&self, field: &str, value: Option<&Value>, numeric: bool) -> String {
        match &self.kind {
            RuleKind::Builtin(builtin) => builtin.message(field, self.spec, value, numeric),
            RuleKind::Extension(extension) => extension.message(field),
        }
    }
}

/// Non-implicit rules skip absent fields and blank strings, and skip nulls
/// when the field is `nullable`.
fn is_validatable(value: Option<&Value>, nullable: bool) -> bool {
    match value {
        None => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Null) => !nullable,
        Some(_) => true,
    }
}
