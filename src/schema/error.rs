use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The check that rejected a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    Type,
    Enum,
    Min,
    Max,
    Pattern,
    Required,
    AdditionalProperties,
    #[serde(rename = "literal-mismatch")]
    Literal,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::Type => "type",
            Rule::Enum => "enum",
            Rule::Min => "min",
            Rule::Max => "max",
            Rule::Pattern => "pattern",
            Rule::Required => "required",
            Rule::AdditionalProperties => "additionalProperties",
            Rule::Literal => "literal-mismatch",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single failure reported for one validation run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message} at {}: {rule}", self.location())]
pub struct ValidationError {
    path: String,
    rule: Rule,
    message: String,
}

impl ValidationError {
    pub(crate) fn new(path: String, rule: Rule, message: String) -> Self {
        Self { path, rule, message }
    }

    /// Location in path syntax (`cars[1].model`); empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &str {
        if self.path.is_empty() { "(root)" } else { &self.path }
    }
}
