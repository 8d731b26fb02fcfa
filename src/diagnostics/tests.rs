//! Unit tests for the diagnostics collector.

use super::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};
use crate::Position;

fn at(line: u32, column: u32) -> Location {
    Location { line, column }
}

fn unresolved(name: &str) -> DiagnosticKind {
    DiagnosticKind::UnresolvedIdentifier {
        name: name.to_string(),
    }
}

#[test]
fn test_messages() {
    assert_eq!(unresolved("foo").to_string(), "No such item in scope: `foo`.");
    assert_eq!(
        DiagnosticKind::IncompatibleOperands {
            op: "-".to_string(),
            left: "`number`".to_string(),
            right: "'a'".to_string(),
        }
        .to_string(),
        "Binary `-`: Incompatible operands `number`, 'a'."
    );
    assert_eq!(DiagnosticKind::UnexpectedReturn.to_string(), "Unexpected `return`.");
}

#[test]
fn test_location_from_position() {
    let location = Location::from(Position {
        offset: 30,
        line: 4,
        column: 2,
    });

    assert_eq!(location, at(4, 2));
    assert_eq!(location.to_string(), "4:2");
}

#[test]
fn test_report_keeps_order() {
    let mut diagnostics = Diagnostics::new(true);
    diagnostics.report(Diagnostic::new(at(1, 0), unresolved("a"), vec![]));
    diagnostics.report(Diagnostic::new(at(2, 0), unresolved("b"), vec![]));

    let result = diagnostics.into_result();
    assert!(result.has_errors());
    let lines: Vec<u32> = result.diagnostics().iter().map(|d| d.location.line).collect();
    assert_eq!(lines, vec![1, 2]);
}

#[test]
fn test_adjacent_same_location_merges() {
    let mut diagnostics = Diagnostics::new(true);
    diagnostics.report(Diagnostic::new(at(3, 4), unresolved("a"), vec![]));
    diagnostics.report(Diagnostic::new(at(3, 4), DiagnosticKind::BrokenAssignment, vec![]));
    diagnostics.report(Diagnostic::new(at(3, 4), unresolved("a"), vec![]));

    let result = diagnostics.into_result();
    assert_eq!(result.diagnostics().len(), 1);

    let merged = &result.diagnostics()[0];
    assert_eq!(
        merged.message,
        "No such item in scope: `a`.\n    Broken assignment."
    );
    assert_eq!(merged.kind, unresolved("a"));
}

#[test]
fn test_merging_disabled() {
    let mut diagnostics = Diagnostics::new(false);
    diagnostics.report(Diagnostic::new(at(3, 4), unresolved("a"), vec![]));
    diagnostics.report(Diagnostic::new(at(3, 4), unresolved("a"), vec![]));

    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_non_adjacent_not_merged() {
    let mut diagnostics = Diagnostics::new(true);
    diagnostics.report(Diagnostic::new(at(1, 0), unresolved("a"), vec![]));
    diagnostics.report(Diagnostic::new(at(2, 0), unresolved("b"), vec![]));
    diagnostics.report(Diagnostic::new(at(1, 0), unresolved("a"), vec![]));

    assert_eq!(diagnostics.len(), 3);
}

#[test]
fn test_display() {
    let diagnostic = Diagnostic::new(
        at(7, 1),
        DiagnosticKind::NotCallable {
            callee: "5".to_string(),
        },
        vec!["f (test.js:7:1)".to_string()],
    );

    assert_eq!(diagnostic.to_string(), "(7,1): Not a function 5.");
}
