//! Fatal error types for the checker.
//!
//! This module defines the errors that abort analysis outright. They cover:
//!
//! - Lexing and parsing failures (the input is not a tree we understand)
//! - Malformed trees (a node without a required child, a bad assignment target)
//! - Internal protocol misuse in the execution stack
//!
//! Problems with the analysed program itself are never `Error`s; those are
//! recorded as diagnostics and analysis carries on.

pub mod errors;

#[cfg(test)]
mod tests;
