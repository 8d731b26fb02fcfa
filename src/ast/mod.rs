/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the tree the checker walks
///
/// Submodules:
/// - ast: The node arena, node handles and the exhaustive node kind enum
/// - expressions: Operators, literals and member keys used by expressions
/// - statements: Declaration and function shapes used by statements
pub mod ast;
pub mod expressions;
pub mod statements;
