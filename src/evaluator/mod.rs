//! The type evaluator.
//!
//! Runs the program over types instead of values: statements update frame
//! bindings, expressions produce types, and problems are recorded as
//! diagnostics while evaluation carries on.

pub mod evaluator;
pub mod options;
