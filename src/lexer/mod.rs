//! Lexical analysis module.
//!
//! This module contains the lexer (tokenizer) that converts JavaScript source
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization using an ordered table of anchored regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Line and column tracking for every token
//! - Comments and whitespace handling

pub mod lexer;
pub mod tokens;
