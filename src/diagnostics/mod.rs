//! Recoverable diagnostics.
//!
//! Problems with the analysed program are collected here instead of aborting
//! the run, so one pass can surface many independent issues.

pub mod diagnostics;

#[cfg(test)]
mod tests;
