use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::domain::rules::RuleSet;
use crate::io::format::{json, toml, yaml};
use crate::io::{self, Format, IoError};

/// Reads one document and converts it into a JSON value.
pub fn read_document<R: Read>(reader: R, format: Format) -> Result<Value, IoError> {
    match format {
        Format::Json => json::read_json(reader),
        Format::Yaml => yaml::read_yaml(reader),
        Format::Toml => toml::read_toml(reader),
    }
}

/// Reads the document at `path`, resolving its format from the extension.
pub fn read_path(path: &Path) -> Result<Value, IoError> {
    let format = io::resolve_format(path)?;
    let file = File::open(path)?;
    read_document(file, format)
}

pub fn read_rule_set(path: &Path) -> Result<RuleSet, IoError> {
    let document = read_path(path)?;
    RuleSet::from_value(document).map_err(|source| IoError::InvalidRules {
        path: path.to_string_lossy().into_owned(),
        source,
    })
}
