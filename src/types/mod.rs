//! The type lattice.
//!
//! Types approximate sets of runtime values: primitives, structural objects
//! and arrays, callable functions, flat unions, and constants whose exact
//! value is known. This module provides:
//!
//! - Structural assignability with a bounded walk depth
//! - Union construction that flattens and deduplicates
//! - Member lookup, membership errors and member writes
//! - Constant pinning and widening

pub mod types;
