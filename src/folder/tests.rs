//! Unit tests for the constant folder.

use super::folder::Folder;
use crate::{
    ast::ast::{Ast, NodeId, NodeKind},
    diagnostics::diagnostics::Diagnostics,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::scope::ScopeGraph,
    value::value::Value,
};

fn setup(source: &str) -> (Ast, ScopeGraph) {
    let ast = parse(tokenize(source).unwrap(), "test.js").unwrap();
    let graph = ScopeGraph::build(&ast, &[], &mut Diagnostics::new(true));
    (ast, graph)
}

/// The expression of the last expression statement.
fn last_expr(ast: &Ast) -> NodeId {
    let NodeKind::Program { body } = ast.kind(ast.root()) else {
        panic!("root is not a program");
    };
    match ast.kind(*body.last().unwrap()) {
        NodeKind::ExprStmt { expr } => *expr,
        other => panic!("not an expression statement: {:?}", other),
    }
}

fn fold(source: &str) -> Option<Value> {
    let (ast, graph) = setup(source);
    let folder = Folder::new(&ast, &graph);
    folder.try_fold(last_expr(&ast))
}

#[test]
fn test_fold_arithmetic() {
    assert_eq!(fold("2 + 3 * 4;"), Some(Value::Number(14.0)));
    assert_eq!(fold("'a' + 1;"), Some(Value::String("a1".to_string())));
    assert_eq!(fold("~5;"), Some(Value::Number(-6.0)));
    assert_eq!(fold("7 % 4 | 8;"), Some(Value::Number(11.0)));
}

#[test]
fn test_fold_rejects_mismatched_operands() {
    assert_eq!(fold("1 - 'a';"), None);
    assert_eq!(fold("1 === '1';"), None);
    assert_eq!(fold("-'3';"), None);
    assert_eq!(fold("true < 2;"), None);
}

#[test]
fn test_fold_logical_and_conditional() {
    assert_eq!(fold("0 || 'x';"), Some(Value::String("x".to_string())));
    assert_eq!(fold("0 && unknown;"), Some(Value::Number(0.0)));
    assert_eq!(fold("1 > 2 ? 'a' : 'b';"), Some(Value::String("b".to_string())));
    assert_eq!(fold("typeof 1;"), Some(Value::String("number".to_string())));
}

#[test]
fn test_fold_single_write_bindings() {
    assert_eq!(fold("var x = 2 + 3; var y = x * 2; y;"), Some(Value::Number(10.0)));
    assert_eq!(fold("const s = 'hi'; s + '!';"), Some(Value::String("hi!".to_string())));
}

#[test]
fn test_fold_skips_reassigned_bindings() {
    assert_eq!(fold("var x = 1; x = 2; x;"), None);
    assert_eq!(fold("var x; x;"), None);
    assert_eq!(fold("function f(n) { return n; } f;"), None);
}

/// The argument of the first `return` in the program.
fn first_return(ast: &Ast) -> NodeId {
    (0..ast.len() as u32)
        .map(NodeId)
        .find_map(|id| match ast.kind(id) {
            NodeKind::Return { argument } => *argument,
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_fold_skips_parameters_written_once() {
    let (ast, graph) = setup("function f(s) { s = 0; return s; } f('a');");
    let folder = Folder::new(&ast, &graph);
    assert_eq!(folder.try_fold(first_return(&ast)), None);

    let (ast, graph) = setup("function h() { try { } catch (e) { e = 1; return e; } }");
    let folder = Folder::new(&ast, &graph);
    assert_eq!(folder.try_fold(first_return(&ast)), None);
}

#[test]
fn test_fold_skips_object_bindings() {
    assert_eq!(fold("var o = { a: 1 }; o;"), None);
    assert_eq!(fold("var o = { a: 1 }; o.a;"), None);
}

#[test]
fn test_fold_literals_and_members() {
    assert_eq!(fold("({ a: [1, 2] }).a[1];"), Some(Value::Number(2.0)));
    assert_eq!(fold("'abc'.length;"), Some(Value::Number(3.0)));
    assert_eq!(fold("({ a: 1 }).b;"), None);
}

#[test]
fn test_fold_cyclic_bindings_terminate() {
    assert_eq!(fold("var a = b; var b = a; a;"), None);
}

#[test]
fn test_fold_is_cached() {
    let (ast, graph) = setup("var x = 4; x * x;");
    let folder = Folder::new(&ast, &graph);
    let expr = last_expr(&ast);

    assert_eq!(folder.try_fold(expr), Some(Value::Number(16.0)));
    assert_eq!(folder.try_fold(expr), Some(Value::Number(16.0)));
}
