//! Constant folding over the tree.
//!
//! Computes exact values for expressions whose inputs are all statically
//! known, independently of the type lattice.

pub mod folder;

#[cfg(test)]
mod tests;
