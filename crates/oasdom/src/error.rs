use std::fmt;

use thiserror::Error;

use crate::coerce::ValueKind;

/// A single field-level problem found while parsing a node tree.
///
/// Paths are JSON-pointer style, rooted at `#` (e.g. `#/parameters/0/in`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// E2001: the value has the wrong basic kind.
    #[error("E2001: {path}: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: ValueKind,
    },

    /// E2002: a required field is absent.
    #[error("E2002: {path}: missing required field '{field}'")]
    Missing { path: String, field: &'static str },

    /// E2003: the value has the right kind but is not an allowed value.
    #[error("E2003: {path}: {reason}")]
    Invalid { path: String, reason: String },

    /// E2004: a polymorphic entry matched none of its candidate shapes.
    #[error("E2004: {path}: matches none of {}{}", shape_list(.attempts), AttemptDetails(.attempts))]
    Unresolved { path: String, attempts: Vec<Attempt> },

    /// E2005: nesting exceeded the configured depth limit.
    #[error("E2005: {path}: nesting deeper than {limit} nodes")]
    TooDeep { path: String, limit: usize },
}

impl Violation {
    /// The location of the offending value.
    pub fn path(&self) -> &str {
        match self {
            Violation::Shape { path, .. }
            | Violation::Missing { path, .. }
            | Violation::Invalid { path, .. }
            | Violation::Unresolved { path, .. }
            | Violation::TooDeep { path, .. } => path,
        }
    }
}

/// One failed trial of a polymorphic resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Name of the node type that was tried.
    pub shape: &'static str,
    /// Why the entry did not fit that shape.
    pub violations: Vec<Violation>,
}

fn shape_list(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| a.shape)
        .collect::<Vec<_>>()
        .join(", ")
}

struct AttemptDetails<'a>(&'a [Attempt]);

impl fmt::Display for AttemptDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attempt in self.0 {
            write!(f, "; as {}:", attempt.shape)?;
            for v in &attempt.violations {
                write!(f, " [{}]", v)?;
            }
        }
        Ok(())
    }
}

/// Every violation found in one parse call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Paths of all violations, in discovery order.
    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(Violation::path).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  - {}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// E2010: a node type was used before its registry was linked.
///
/// This is an initialization-order bug in the caller, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("E2010: type '{type_name}' used before the type registry was linked")]
pub struct UnlinkedTypeError {
    pub type_name: &'static str,
}

/// Errors raised while declaring or linking node types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// E2011: a field refers to a type name nobody declared.
    #[error("E2011: {owner}.{field} refers to undeclared type '{name}'")]
    UnknownType {
        owner: &'static str,
        field: &'static str,
        name: &'static str,
    },

    /// E2012: the same type name was declared twice.
    #[error("E2012: type '{0}' is already declared")]
    Duplicate(&'static str),

    /// E2013: declarations are closed once the registry is linked.
    #[error("E2013: cannot declare '{0}' after the registry was linked")]
    AlreadyLinked(&'static str),
}

/// Errors returned by node parse and serialize operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The input did not describe a valid node.
    #[error("invalid document: {0}")]
    Invalid(ValidationErrors),

    /// The registry has not been linked.
    #[error(transparent)]
    Unlinked(#[from] UnlinkedTypeError),

    /// Linking the registry failed.
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl ModelError {
    /// The aggregated violations, if this is a data error.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            ModelError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ModelError {
    fn from(errors: ValidationErrors) -> Self {
        ModelError::Invalid(errors)
    }
}
