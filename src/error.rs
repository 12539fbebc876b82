use thiserror::Error;

use crate::tag::TypeTag;

/// Hard failures of the accessor family. Only `assert_get` and strict chain
/// resolution surface these; every defaulting call absorbs them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// A non-optional step of a chain had nothing to resolve to.
    #[error("nothing at `{at}`")]
    Absent { at: String },

    /// An `assert_get` site found a missing or differently typed value.
    #[error("assertion failed at `{at}`: expected {expected}, found {}", found.map_or("nothing", TypeTag::name))]
    Assertion {
        at: String,
        expected: TypeTag,
        found: Option<TypeTag>,
    },

    #[error(transparent)]
    Syntax(#[from] PathSyntaxError),
}

impl AccessError {
    pub(crate) fn assertion(at: impl Into<String>, expected: TypeTag, found: Option<TypeTag>) -> Self {
        AccessError::Assertion { at: at.into(), expected, found }
    }
}

/// Malformed path text, reported before any data is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed path `{path}` at offset {offset}: {reason}")]
pub struct PathSyntaxError {
    pub path: String,
    pub offset: usize,
    pub reason: &'static str,
}
