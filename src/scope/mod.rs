//! Static scope resolution.
//!
//! One pass over the tree creates a [`scope::Scope`] for every
//! scope-introducing node and a [`scope::Symbol`] for every declaration,
//! then resolves each identifier to the symbol it names.

pub mod scope;
