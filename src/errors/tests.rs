//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;

fn at(offset: u32) -> Position {
    Position {
        offset,
        line: 1,
        column: offset,
    }
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        at(42),
    );

    assert_eq!(error.get_position().offset, 42);
    assert_eq!(error.get_position().column, 42);
}

#[test]
fn test_unsupported_syntax_error() {
    let error = Error::new(
        ErrorImpl::UnsupportedSyntax {
            construct: "++".to_string(),
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "UnsupportedSyntax");
    assert_eq!(
        error.get_tip().to_string(),
        "`++` is not supported by the checker"
    );
}

#[test]
fn test_scope_generation_error() {
    let error = Error::new(
        ErrorImpl::ScopeGenerationOrder {
            origin: 4,
            callee: 2,
        },
        at(0),
    );

    assert_eq!(error.get_error_name(), "ScopeGenerationOrder");
    assert!(error.to_string().starts_with("callee scope 2 is not newer"));
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        at(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_location() {
    let error = Error::new(
        ErrorImpl::MissingFrame {
            symbol: "x".to_string(),
        },
        Position {
            offset: 7,
            line: 3,
            column: 4,
        },
    );

    assert_eq!(error.to_string(), "no frame holds binding \"x\" at 3:4");
}
