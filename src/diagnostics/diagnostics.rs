use std::fmt::Display;

use thiserror::Error;
use tracing::trace;

use crate::Position;

/// Source location of a diagnostic. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl From<Position> for Location {
    fn from(position: Position) -> Self {
        Location {
            line: position.line,
            column: position.column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Every problem the checker can report about a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    #[error("No such item in scope: `{name}`.")]
    UnresolvedIdentifier { name: String },
    #[error("Multiple declarations for `{name}`.")]
    DuplicateDeclaration { name: String },
    #[error("Assigning to a constant: `{name}`.")]
    AssignToConstant { name: String },
    #[error("Assigning to variable before init: `{name}`.")]
    AssignToUndeclared { name: String },
    #[error("Binary `{op}`: Incompatible operands {left}, {right}.")]
    IncompatibleOperands {
        op: String,
        left: String,
        right: String,
    },
    #[error("Unary `{op}`: Incompatible argument.")]
    IncompatibleArgument { op: String },
    #[error("No property {key} defined on {object}.")]
    MissingProperty { key: String, object: String },
    #[error("Immutable type on the left-hand side of an assignment.")]
    ImmutableAssignment,
    #[error("Broken assignment.")]
    BrokenAssignment,
    #[error("Not a function {callee}.")]
    NotCallable { callee: String },
    #[error("Unexpected `return`.")]
    UnexpectedReturn,
    #[error("Assigning `undefined`.")]
    AssignUndefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
    /// Kind of the first problem recorded at this location.
    pub kind: DiagnosticKind,
    /// Call chain leading to the problem, innermost call first. Empty for
    /// problems outside any function call.
    pub trace: Vec<String>,
}

impl Diagnostic {
    pub fn new(location: Location, kind: DiagnosticKind, trace: Vec<String>) -> Self {
        Diagnostic {
            location,
            message: kind.to_string(),
            kind,
            trace,
        }
    }

    fn messages(&self) -> impl Iterator<Item = &str> {
        self.message.split(MESSAGE_SEPARATOR)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{}): {}", self.location.line, self.location.column, self.message)
    }
}

const MESSAGE_SEPARATOR: &str = "\n    ";

/// Collector the scope builder and evaluator report into.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    merge: bool,
}

impl Diagnostics {
    pub fn new(merge: bool) -> Self {
        Diagnostics {
            records: vec![],
            merge,
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        trace!(
            location = %diagnostic.location,
            message = %diagnostic.message,
            "diagnostic"
        );

        if self.merge {
            if let Some(last) = self.records.last_mut() {
                if last.location == diagnostic.location {
                    if !last.messages().any(|message| message == diagnostic.message) {
                        last.message.push_str(MESSAGE_SEPARATOR);
                        last.message.push_str(&diagnostic.message);
                    }
                    return;
                }
            }
        }

        self.records.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_result(self) -> CheckResult {
        CheckResult {
            diagnostics: self.records,
        }
    }
}

/// Outcome of checking one program.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Diagnostics in the order they were reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
