//! Concrete values with JavaScript operator semantics.
//!
//! Constants carried by the type lattice and results of the constant folder
//! are both expressed as [`value::Value`].

pub mod value;

#[cfg(test)]
mod tests;
