use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnsupportedSyntax { .. } => "UnsupportedSyntax",
            ErrorImpl::MissingChild { .. } => "MissingChild",
            ErrorImpl::InvalidTarget { .. } => "InvalidTarget",
            ErrorImpl::ScopeGenerationOrder { .. } => "ScopeGenerationOrder",
            ErrorImpl::MissingFrame { .. } => "MissingFrame",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => {
                ErrorTip::Suggestion(format!("Invalid number literal: `{}`", token))
            }
            ErrorImpl::UnsupportedSyntax { construct } => {
                ErrorTip::Suggestion(format!("`{}` is not supported by the checker", construct))
            }
            ErrorImpl::MissingChild { node, child } => {
                ErrorTip::Suggestion(format!("`{}` node is missing its `{}`", node, child))
            }
            ErrorImpl::InvalidTarget { node } => ErrorTip::Suggestion(format!(
                "`{}` cannot appear on the left-hand side of an assignment",
                node
            )),
            ErrorImpl::ScopeGenerationOrder { origin, callee } => ErrorTip::Suggestion(format!(
                "Callee scope #{} entered from a later scope #{}",
                callee, origin
            )),
            ErrorImpl::MissingFrame { symbol } => ErrorTip::Suggestion(format!(
                "No live frame owns the binding `{}`",
                symbol
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.internal_error, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unsupported syntax: {construct}")]
    UnsupportedSyntax { construct: String },
    #[error("{node} is missing its {child}")]
    MissingChild { node: String, child: String },
    #[error("invalid assignment target: {node}")]
    InvalidTarget { node: String },
    #[error("callee scope {callee} is not newer than origin scope {origin}")]
    ScopeGenerationOrder { origin: usize, callee: usize },
    #[error("no frame holds binding {symbol:?}")]
    MissingFrame { symbol: String },
}
