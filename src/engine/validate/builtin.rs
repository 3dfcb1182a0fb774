use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::domain::error::RuleError;
use crate::domain::rules::RuleSpec;

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern is valid")
});
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(0|[1-9]\d*)$").expect("integer pattern is valid"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(https?|ftps?)://[^\s/?#@]+(@[^\s/?#]+)?(:\d+)?([/?#]\S*)?$")
        .expect("url pattern is valid")
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is valid")
});
static ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}]+$").expect("alpha pattern is valid"));
static ALPHA_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}\p{N}]+$").expect("alpha_num pattern is valid"));
static ALPHA_DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}\p{N}_-]+$").expect("alpha_dash pattern is valid"));

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Rule implemented by the validator itself.
#[derive(Debug, Clone)]
pub(crate) enum Builtin {
    Bail,
    Nullable,
    Sometimes,
    Required,
    Present,
    Filled,
    String,
    Integer,
    Numeric,
    Boolean,
    Array,
    Json,
    Url,
    Email,
    Date,
    Regex(Regex),
    NotRegex(Regex),
    Alpha,
    AlphaNum,
    AlphaDash,
    Digits(usize),
    Min(f64),
    Max(f64),
    Between(f64, f64),
    Size(f64),
    In(Vec<String>),
    NotIn(Vec<String>),
}

impl Builtin {
    /// Compiles `spec`, returning `Ok(None)` when the name is not a builtin.
    pub(crate) fn compile(field: &str, spec: &RuleSpec) -> Result<Option<Self>, RuleError> {
        let parameters = spec.parameters();
        let rule = match spec.name() {
            "bail" => Self::Bail,
            "nullable" => Self::Nullable,
            "sometimes" => Self::Sometimes,
            "required" => Self::Required,
            "present" => Self::Present,
            "filled" => Self::Filled,
            "string" => Self::String,
            "integer" => Self::Integer,
            "numeric" => Self::Numeric,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "json" => Self::Json,
            "url" => Self::Url,
            "email" => Self::Email,
            "date" => Self::Date,
            "regex" => Self::Regex(pattern_parameter(field, spec)?),
            "not_regex" => Self::NotRegex(pattern_parameter(field, spec)?),
            "alpha" => Self::Alpha,
            "alpha_num" => Self::AlphaNum,
            "alpha_dash" => Self::AlphaDash,
            "digits" => {
                let [length] = exact_parameters::<1>(field, spec)?;
                let length = length.parse::<usize>().map_err(|_| {
                    invalid_parameter(field, spec, format!("`{length}` is not a digit count"))
                })?;
                Self::Digits(length)
            }
            "min" => {
                let [limit] = exact_parameters::<1>(field, spec)?;
                Self::Min(number_parameter(field, spec, limit)?)
            }
            "max" => {
                let [limit] = exact_parameters::<1>(field, spec)?;
                Self::Max(number_parameter(field, spec, limit)?)
            }
            "size" => {
                let [size] = exact_parameters::<1>(field, spec)?;
                Self::Size(number_parameter(field, spec, size)?)
            }
            "between" => {
                let [min, max] = exact_parameters::<2>(field, spec)?;
                let min = number_parameter(field, spec, min)?;
                let max = number_parameter(field, spec, max)?;
                if min > max {
                    return Err(invalid_parameter(
                        field,
                        spec,
                        "lower bound must be <= upper bound".to_string(),
                    ));
                }
                Self::Between(min, max)
            }
            "in" => Self::In(list_parameters(field, spec)?),
            "not_in" => Self::NotIn(list_parameters(field, spec)?),
            _ => return Ok(None),
        };

        if parameters.is_empty() || rule.takes_parameters() {
            Ok(Some(rule))
        } else {
            Err(invalid_parameter(
                field,
                spec,
                "rule does not take parameters".to_string(),
            ))
        }
    }

    /// Implicit rules run even when the field is absent or empty.
    pub(crate) fn is_implicit(&self) -> bool {
        matches!(self, Self::Required | Self::Present | Self::Filled)
    }

    /// Markers change how other rules apply and never fail themselves.
    pub(crate) fn is_marker(&self) -> bool {
        matches!(self, Self::Bail | Self::Nullable | Self::Sometimes)
    }

    pub(crate) fn is_numeric_type(&self) -> bool {
        matches!(self, Self::Numeric | Self::Integer)
    }

    fn takes_parameters(&self) -> bool {
        matches!(
            self,
            Self::Regex(_)
                | Self::NotRegex(_)
                | Self::Digits(_)
                | Self::Min(_)
                | Self::Max(_)
                | Self::Between(..)
                | Self::Size(_)
                | Self::In(_)
                | Self::NotIn(_)
        )
    }

    /// `value` is `None` when the field is absent from the record.
    pub(crate) fn passes(&self, value: Option<&Value>, numeric: bool) -> bool {
        match self {
            Self::Bail | Self::Nullable | Self::Sometimes => true,
            Self::Required => value.is_some_and(is_filled),
            Self::Present => value.is_some(),
            Self::Filled => value.is_none_or(is_filled),
            _ => value.is_some_and(|value| self.passes_present(value, numeric)),
        }
    }

    fn passes_present(&self, value: &Value, numeric: bool) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => is_integer(value),
            Self::Numeric => numeric_value(value).is_some(),
            Self::Boolean => match value {
                Value::Bool(_) => true,
                Value::Number(number) => matches!(number.as_i64(), Some(0 | 1)),
                Value::String(text) => text == "0" || text == "1",
                _ => false,
            },
            Self::Array => value.is_array() || value.is_object(),
            Self::Json => match value {
                Value::String(text) => serde_json::from_str::<Value>(text).is_ok(),
                Value::Number(_) | Value::Bool(_) => true,
                _ => false,
            },
            Self::Url => value.as_str().is_some_and(|text| URL_RE.is_match(text)),
            Self::Email => value.as_str().is_some_and(|text| EMAIL_RE.is_match(text)),
            Self::Date => value.as_str().is_some_and(is_date),
            Self::Regex(pattern) => scalar_text(value).is_some_and(|text| pattern.is_match(&text)),
            Self::NotRegex(pattern) => {
                scalar_text(value).is_some_and(|text| !pattern.is_match(&text))
            }
            Self::Alpha => value.as_str().is_some_and(|text| ALPHA_RE.is_match(text)),
            Self::AlphaNum => {
                alnum_text(value).is_some_and(|text| ALPHA_NUM_RE.is_match(&text))
            }
            Self::AlphaDash => {
                alnum_text(value).is_some_and(|text| ALPHA_DASH_RE.is_match(&text))
            }
            Self::Digits(length) => scalar_text(value).is_some_and(|text| {
                !text.is_empty()
                    && text.chars().all(|ch| ch.is_ascii_digit())
                    && text.len() == *length
            }),
            Self::Min(limit) => measure(value, numeric) >= *limit,
            Self::Max(limit) => measure(value, numeric) <= *limit,
            Self::Between(min, max) => {
                let size = measure(value, numeric);
                size >= *min && size <= *max
            }
            Self::Size(expected) => measure(value, numeric) == *expected,
            Self::In(allowed) => match value {
                Value::Array(items) => items.iter().all(|item| is_listed(item, allowed)),
                Value::Object(_) => false,
                scalar => is_listed(scalar, allowed),
            },
            Self::NotIn(denied) => match value {
                Value::Array(items) => !items.iter().any(|item| is_listed(item, denied)),
                Value::Object(_) => false,
                scalar => !is_listed(scalar, denied),
            },
            Self::Bail
            | Self::Nullable
            | Self::Sometimes
            | Self::Required
            | Self::Present
            | Self::Filled => true,
        }
    }

    pub(crate) fn message(
        &self,
        field: &str,
        spec: &RuleSpec,
        value: Option<&Value>,
        numeric: bool,
    ) -> String {
        let parameters = spec.parameters();
        let first = parameters.first().map(String::as_str).unwrap_or_default();
        let second = parameters.get(1).map(String::as_str).unwrap_or_default();
        let kind = value.map(|value| size_kind(value, numeric));

        match self {
            Self::Bail | Self::Nullable | Self::Sometimes => String::new(),
            Self::Required => format!("The {field} field is required."),
            Self::Present => format!("The {field} field must be present."),
            Self::Filled => format!("The {field} field must have a value."),
            Self::String => format!("The {field} must be a string."),
            Self::Integer => format!("The {field} must be an integer."),
            Self::Numeric => format!("The {field} must be a number."),
            Self::Boolean => format!("The {field} field must be true or false."),
            Self::Array => format!("The {field} must be an array."),
            Self::Json => format!("The {field} must be a valid JSON string."),
            Self::Url | Self::Regex(_) | Self::NotRegex(_) => {
                format!("The {field} format is invalid.")
            }
            Self::Email => format!("The {field} must be a valid email address."),
            Self::Date => format!("The {field} is not a valid date."),
            Self::Alpha => format!("The {field} may only contain letters."),
            Self::AlphaNum => format!("The {field} may only contain letters and numbers."),
            Self::AlphaDash => {
                format!("The {field} may only contain letters, numbers, dashes and underscores.")
            }
            Self::Digits(_) => format!("The {field} must be {first} digits."),
            Self::Min(_) => match kind {
                Some(SizeKind::Numeric) => format!("The {field} must be at least {first}."),
                Some(SizeKind::Items) => {
                    format!("The {field} must have at least {first} items.")
                }
                _ => format!("The {field} must be at least {first} characters."),
            },
            Self::Max(_) => match kind {
                Some(SizeKind::Numeric) => {
                    format!("The {field} may not be greater than {first}.")
                }
                Some(SizeKind::Items) => {
                    format!("The {field} may not have more than {first} items.")
                }
                _ => format!("The {field} may not be greater than {first} characters."),
            },
            Self::Between(..) => match kind {
                Some(SizeKind::Numeric) => {
                    format!("The {field} must be between {first} and {second}.")
                }
                Some(SizeKind::Items) => {
                    format!("The {field} must have between {first} and {second} items.")
                }
                _ => format!("The {field} must be between {first} and {second} characters."),
            },
            Self::Size(_) => match kind {
                Some(SizeKind::Numeric) => format!("The {field} must be {first}."),
                Some(SizeKind::Items) => format!("The {field} must contain {first} items."),
                _ => format!("The {field} must be {first} characters."),
            },
            Self::In(_) | Self::NotIn(_) => format!("The selected {field} is invalid."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeKind {
    Numeric,
    Items,
    Characters,
}

fn size_kind(value: &Value, numeric: bool) -> SizeKind {
    if numeric && numeric_value(value).is_some() {
        SizeKind::Numeric
    } else if value.is_array() || value.is_object() {
        SizeKind::Items
    } else {
        SizeKind::Characters
    }
}

/// Size used by `min`/`max`/`between`/`size`: the number itself for numeric
/// fields, the element count for collections, otherwise the character count.
fn measure(value: &Value, numeric: bool) -> f64 {
    if numeric {
        if let Some(number) = numeric_value(value) {
            return number;
        }
    }
    let count = match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(text) => text.chars().count(),
        Value::Number(number) => number.to_string().chars().count(),
        Value::Bool(true) => 1,
        Value::Bool(false) | Value::Null => 0,
    };
    count as f64
}

pub(crate) fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(number) => number.is_i64() || number.is_u64(),
        Value::String(text) => INTEGER_RE.is_match(text.trim()),
        _ => false,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if NUMERIC_RE.is_match(text) {
                text.parse::<f64>().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_date(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || NAIVE_DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
}

/// Text form of a string or number; other values have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn alnum_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

/// Membership compares the scalar's text form, so `in:1,2` accepts `1` and `"1"`.
fn is_listed(value: &Value, list: &[String]) -> bool {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => return false,
    };
    list.iter().any(|candidate| *candidate == text)
}

fn exact_parameters<'a, const N: usize>(
    field: &str,
    spec: &'a RuleSpec,
) -> Result<[&'a str; N], RuleError> {
    let parameters = spec.parameters();
    if parameters.len() != N {
        return Err(invalid_parameter(
            field,
            spec,
            format!("expected {N} parameter(s), found {}", parameters.len()),
        ));
    }
    Ok(std::array::from_fn(|index| parameters[index].as_str()))
}

fn number_parameter(field: &str, spec: &RuleSpec, raw: &str) -> Result<f64, RuleError> {
    raw.parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| invalid_parameter(field, spec, format!("`{raw}` is not a number")))
}

fn list_parameters(field: &str, spec: &RuleSpec) -> Result<Vec<String>, RuleError> {
    if spec.parameters().is_empty() {
        return Err(invalid_parameter(
            field,
            spec,
            "expected at least one value".to_string(),
        ));
    }
    Ok(spec.parameters().to_vec())
}

fn pattern_parameter(field: &str, spec: &RuleSpec) -> Result<Regex, RuleError> {
    let [raw] = exact_parameters::<1>(field, spec)?;
    compile_pattern(raw).map_err(|reason| invalid_parameter(field, spec, reason))
}

/// Accepts `/body/flags` delimited patterns as well as bare patterns.
fn compile_pattern(raw: &str) -> Result<Regex, String> {
    let delimited = raw
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])));

    let pattern = match delimited {
        Some((body, flags)) => {
            let mut inline = String::new();
            for flag in flags.chars() {
                match flag {
                    'i' | 'm' | 's' | 'x' => inline.push(flag),
                    'u' => {}
                    other => return Err(format!("unsupported pattern flag `{other}`")),
                }
            }
            if inline.is_empty() {
                body.to_string()
            } else {
                format!("(?{inline}){body}")
            }
        }
        None => raw.to_string(),
    };

    Regex::new(&pattern).map_err(|error| format!("invalid pattern: {error}"))
}

fn invalid_parameter(field: &str, spec: &RuleSpec, reason: String) -> RuleError {
    RuleError::InvalidParameter {
        field: field.to_string(),
        rule: spec.name().to_string(),
        reason,
    }
}
