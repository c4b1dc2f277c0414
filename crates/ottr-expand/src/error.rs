/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template registration and expansion.

use crate::expand_context::Frame;
use crate::term::Term;
use std::fmt;
use thiserror::Error;

/// What went wrong during registration or expansion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// An instance references a template that is not defined.
    #[error("Unknown template: {name}")]
    UnknownTemplate { name: String },

    /// A template with this name is already registered.
    #[error("Template already defined: {name}")]
    DuplicateTemplate { name: String },

    /// The argument count does not fit the signature.
    #[error(
        "Template {template} declares {parameters} parameter(s) but was given {arguments} argument(s): {reason}"
    )]
    ArityMismatch {
        template: String,
        parameters: usize,
        arguments: usize,
        reason: String,
    },

    /// An argument does not have the declared parameter type.
    #[error("Argument {actual} for parameter ?{parameter} of {template} is not of type {expected}")]
    TypeMismatch {
        template: String,
        parameter: String,
        expected: String,
        actual: Term,
    },

    /// Zip-expanded list arguments have different lengths.
    #[error("Zip-expanded lists of {template} have different lengths: {}", format_lengths(.lengths))]
    ListLengthMismatch {
        template: String,
        lengths: Vec<(String, usize)>,
    },

    /// A variable has no binding in scope.
    #[error("Unbound variable: ?{name}")]
    UnboundVariable { name: String },

    /// A name was bound twice in one scope.
    #[error("Variable ?{name} is bound more than once")]
    DuplicateBinding { name: String },

    /// The same template was entered again with identical arguments.
    #[error("Cyclic expansion: {template}{} is already being expanded", format_args_tuple(.arguments))]
    CyclicExpansion {
        template: String,
        arguments: Vec<Term>,
    },

    /// The call stack grew past the configured ceiling.
    #[error("Expansion depth exceeded (limit {limit})")]
    DepthExceeded { limit: usize },

    /// A blank node was passed to a non-blank parameter.
    #[error("Parameter ?{parameter} of {template} does not accept blank nodes, got {value}")]
    BlankNodeNotAllowed {
        template: String,
        parameter: String,
        value: Term,
    },

    /// A resolved term cannot occupy its triple position.
    #[error("Invalid {position} in triple: {term} ({reason})")]
    InvalidTriple {
        position: String,
        term: Term,
        reason: String,
    },
}

impl ErrorKind {
    /// Stable diagnostic code for this kind of error.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnknownTemplate { .. } => "OX-1001",
            ErrorKind::DuplicateTemplate { .. } => "OX-1002",
            ErrorKind::ArityMismatch { .. } => "OX-2001",
            ErrorKind::TypeMismatch { .. } => "OX-2002",
            ErrorKind::BlankNodeNotAllowed { .. } => "OX-2003",
            ErrorKind::ListLengthMismatch { .. } => "OX-2004",
            ErrorKind::UnboundVariable { .. } => "OX-3001",
            ErrorKind::DuplicateBinding { .. } => "OX-3002",
            ErrorKind::CyclicExpansion { .. } => "OX-4001",
            ErrorKind::DepthExceeded { .. } => "OX-4002",
            ErrorKind::InvalidTriple { .. } => "OX-5001",
        }
    }
}

fn format_lengths(lengths: &[(String, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("?{} has {}", name, len))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_args_tuple(arguments: &[Term]) -> String {
    let rendered: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
    format!("({})", rendered.join(", "))
}

/// Snapshot of the expansion call stack, outermost frame first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallTrace(pub Vec<Frame>);

impl CallTrace {
    pub fn frames(&self) -> &[Frame] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.0.iter().rev() {
            write!(f, "\n  in {}", frame)?;
        }
        Ok(())
    }
}

/// An expansion failure together with the call stack at the failure point.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{}] {kind}{trace}", .kind.code())]
pub struct ExpansionError {
    pub kind: ErrorKind,
    pub trace: CallTrace,
}

impl ExpansionError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Attach a trace unless one was recorded closer to the failure.
    pub(crate) fn with_trace(mut self, trace: CallTrace) -> Self {
        if self.trace.is_empty() {
            self.trace = trace;
        }
        self
    }
}

impl From<ErrorKind> for ExpansionError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            trace: CallTrace::default(),
        }
    }
}

/// Result type for expansion operations.
pub type ExpandResult<T> = Result<T, ExpansionError>;

/// A root instance that failed inside a mapping run.
#[derive(Debug, Clone, PartialEq)]
pub struct RootFailure {
    /// Position of the root in the submitted list.
    pub index: usize,
    /// Template name as submitted.
    pub template: String,
    pub error: ExpansionError,
}

impl fmt::Display for RootFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root #{} ({}): {}", self.index, self.template, self.error)
    }
}

/// Aggregated failure of an all-or-nothing mapping run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} of {roots} root instance(s) failed to expand{}", .failures.len(), format_failures(.failures))]
pub struct MappingError {
    pub roots: usize,
    pub failures: Vec<RootFailure>,
}

fn format_failures(failures: &[RootFailure]) -> String {
    failures.iter().map(|f| format!("\n{}", f)).collect()
}

/// One problem found by static registry validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationProblem {
    pub template: String,
    pub kind: ErrorKind,
}

/// All problems found by [`crate::TemplateRegistry::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Template library has {} problem(s){}", .problems.len(), format_problems(.problems))]
pub struct ValidationError {
    pub problems: Vec<ValidationProblem>,
}

fn format_problems(problems: &[ValidationProblem]) -> String {
    problems
        .iter()
        .map(|p| format!("\n{}: [{}] {}", p.template, p.kind.code(), p.kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code_and_trace() {
        let error = ExpansionError {
            kind: ErrorKind::UnboundVariable {
                name: "x".to_string(),
            },
            trace: CallTrace(vec![
                Frame {
                    template: "http://example.com/Outer".to_string(),
                    arguments: vec![Term::iri("http://example.com/a")],
                },
                Frame {
                    template: "http://example.com/Inner".to_string(),
                    arguments: vec![],
                },
            ]),
        };
        assert_eq!(
            error.to_string(),
            "[OX-3001] Unbound variable: ?x\n  in http://example.com/Inner()\n  in http://example.com/Outer(<http://example.com/a>)"
        );
    }

    #[test]
    fn test_with_trace_keeps_innermost() {
        let inner = CallTrace(vec![Frame {
            template: "inner".to_string(),
            arguments: vec![],
        }]);
        let error = ExpansionError::from(ErrorKind::DepthExceeded { limit: 3 })
            .with_trace(inner.clone())
            .with_trace(CallTrace::default());
        assert_eq!(error.trace, inner);
    }

    #[test]
    fn test_list_length_message() {
        let kind = ErrorKind::ListLengthMismatch {
            template: "T".to_string(),
            lengths: vec![("a".to_string(), 2), ("b".to_string(), 3)],
        };
        assert_eq!(
            kind.to_string(),
            "Zip-expanded lists of T have different lengths: ?a has 2, ?b has 3"
        );
        assert_eq!(kind.code(), "OX-2004");
    }
}
