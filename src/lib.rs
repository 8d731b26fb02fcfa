#![allow(clippy::module_inception)]

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod diagnostics;
pub mod errors;
pub mod evaluator;
pub mod folder;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod scope;
pub mod stack;
pub mod types;
pub mod value;

extern crate regex;

pub use diagnostics::diagnostics::{CheckResult, Diagnostic, Location};
pub use evaluator::evaluator::{check, check_source, check_with_options};
pub use evaluator::options::CheckOptions;

/// A point in the source text. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn null() -> Self {
        Position {
            offset: 0,
            line: 0,
            column: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Finds the line holding byte `position` of `content`.
///
/// Returns the 1-based line number, the line text and the offset of
/// `position` within that line.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    if pos > content.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    // Position sits at the very end of input.
    let last = content.rsplit('\n').next().unwrap_or("");
    Some((line_number.max(2) - 1, last.to_string(), last.len()))
}


/// Prints a fatal error with the offending source line underneath.
pub fn display_error(error: &Error, source: &str, file: &str) {
    /*
        Error: UnexpectedToken (Unexpected token: `}`, did you miss a semicolon?)
        -> final.js
           |
        20 | var a = #;
           | --------^
    */

    let position = error.get_position();

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    eprintln!("-> {}", file);

    print_excerpt(source, position.offset);
}

/// Prints a checker diagnostic in the same layout as fatal errors, followed
/// by its call trace.
pub fn display_diagnostic(diagnostic: &Diagnostic, source: &str, file: &str) {
    eprintln!("Error: {}", diagnostic.message);
    eprintln!(
        "-> {}:{}:{}",
        file, diagnostic.location.line, diagnostic.location.column
    );

    if let Some(offset) = offset_of(source, diagnostic.location) {
        print_excerpt(source, offset);
    }

    for frame in &diagnostic.trace {
        eprintln!("    at {}", frame);
    }
}

fn print_excerpt(source: &str, offset: u32) {
    let Some((line, line_text, line_pos)) = crate::get_line_at_position(source, offset) else {
        return;
    };

    let line_str = line.to_string();
    let padding = line_str.len() + 2;

    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_str, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn offset_of(source: &str, location: Location) -> Option<u32> {
    let mut offset = 0usize;
    for (index, line) in source.split_inclusive('\n').enumerate() {
        if index + 1 == location.line as usize {
            let column: usize = line
                .chars()
                .take(location.column as usize)
                .map(char::len_utf8)
                .sum();
            return Some((offset + column) as u32);
        }
        offset += line.len();
    }

    None
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
