use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::error::RuleError;
use crate::io::{self, IoError};

/// Rules that take their whole parameter string verbatim instead of a
/// comma-separated list.
const VERBATIM_PARAMETER_RULES: &[&str] = &["regex", "not_regex"];

/// One rule identifier with its parameters (`min:3` → `min`, `["3"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleSpec {
    name: String,
    parameters: Vec<String>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some((name, raw_parameters)) = input.split_once(':') else {
            return Self::new(input, Vec::new());
        };

        let parameters = if VERBATIM_PARAMETER_RULES.contains(&name) {
            vec![raw_parameters.to_string()]
        } else {
            raw_parameters
                .split(',')
                .map(|parameter| parameter.trim().to_string())
                .collect()
        };
        Self::new(name, parameters)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.parameters.is_empty() {
            write!(f, ":{}", self.parameters.join(","))?;
        }
        Ok(())
    }
}

/// Rules attached to one field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub path: String,
    pub rules: Vec<RuleSpec>,
}

/// Ordered mapping of field path to the rules applied to one record.
///
/// Insertion order is preserved; defining a field twice replaces its rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `rules` for `path`. The path is checked when the rule set is
    /// compiled by a validator.
    pub fn field<I, S>(mut self, path: &str, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| RuleSpec::parse(rule.as_ref()))
            .filter(|rule| !rule.name().is_empty())
            .collect();
        self.insert(FieldRules {
            path: path.to_string(),
            rules,
        });
        self
    }

    /// Adds rules written as one pipe-delimited string (`required|integer`).
    pub fn pipe(self, path: &str, rules: &str) -> Self {
        self.field(path, split_pipe(rules))
    }

    /// Loads a rule set from a `.json`, `.yaml`/`.yml` or `.toml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        io::reader::read_rule_set(path.as_ref())
    }

    pub fn from_value(value: Value) -> Result<Self, RuleError> {
        match value {
            Value::Object(map) => Self::try_from(map),
            _ => Err(RuleError::InvalidDefinition {
                field: "<root>".to_string(),
            }),
        }
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn get(&self, path: &str) -> Option<&[RuleSpec]> {
        self.fields
            .iter()
            .find(|field| field.path == path)
            .map(|field| field.rules.as_slice())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn insert(&mut self, field: FieldRules) {
        if let Some(existing) = self
            .fields
            .iter_mut()
            .find(|existing| existing.path == field.path)
        {
            existing.rules = field.rules;
        } else {
            self.fields.push(field);
        }
    }
}

impl TryFrom<Map<String, Value>> for RuleSet {
    type Error = RuleError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut rule_set = Self::new();
        for (field, definition) in map {
            rule_set = match definition {
                Value::String(pipe) => rule_set.pipe(&field, &pipe),
                Value::Array(items) => {
                    let mut rules = Vec::with_capacity(items.len());
                    for item in items {
                        let Value::String(rule) = item else {
                            return Err(RuleError::InvalidDefinition { field });
                        };
                        rules.push(rule);
                    }
                    rule_set.field(&field, rules)
                }
                _ => return Err(RuleError::InvalidDefinition { field }),
            };
        }
        Ok(rule_set)
    }
}

fn split_pipe(rules: &str) -> Vec<&str> {
    rules.split('|').filter(|rule| !rule.trim().is_empty()).collect()
}
