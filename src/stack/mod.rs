//! The execution stack the evaluator runs on.
//!
//! Frames bind symbols to their current types. Each frame links to its
//! caller (the call stack) and to its lexical parent (the scope chain), which
//! differ once closures are called away from where they were defined.

pub mod stack;

#[cfg(test)]
mod tests;
