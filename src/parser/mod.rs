//! Parser module for building the node arena.
//!
//! This module contains the parser that transforms a stream of tokens
//! into an [`Ast`](crate::ast::ast::Ast). It uses a Pratt parser for
//! expressions with proper operator precedence and handles:
//!
//! - Statement parsing (declarations, functions, control flow)
//! - Expression parsing (binary ops, calls, literals, arrow functions)
//! - Optional semicolons at line breaks, before `}` and at end of input
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;

#[cfg(test)]
mod tests;
