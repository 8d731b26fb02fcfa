//! Unit tests for frames and the scope chain.

use std::rc::Rc;

use super::stack::Frame;
use crate::{
    ast::ast::{Ast, NodeId, NodeKind},
    diagnostics::diagnostics::Diagnostics,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::scope::{ScopeGraph, SymbolId},
    types::types::Type,
    value::value::Value,
};

const SOURCE: &str = "var a = 1;\nfunction f(b) { { let c = b; } return b; }\nf(2);";

fn setup() -> (Ast, ScopeGraph) {
    let ast = parse(tokenize(SOURCE).unwrap(), "stack.js").unwrap();
    let graph = ScopeGraph::build(&ast, &[], &mut Diagnostics::new(true));
    (ast, graph)
}

fn find(ast: &Ast, predicate: impl Fn(&NodeKind) -> bool) -> NodeId {
    (0..ast.len() as u32)
        .map(NodeId)
        .find(|id| predicate(ast.kind(*id)))
        .unwrap()
}

fn symbol(graph: &ScopeGraph, name: &str) -> SymbolId {
    graph.symbols().iter().find(|s| s.name == name).unwrap().id
}

fn function(ast: &Ast) -> NodeId {
    find(ast, |kind| matches!(kind, NodeKind::Function(_)))
}

fn call(ast: &Ast) -> NodeId {
    find(ast, |kind| matches!(kind, NodeKind::Call { .. }))
}

fn constant(frame: &Frame, ast: &Ast, graph: &ScopeGraph, name: &str) -> Option<Value> {
    frame
        .scope_read(ast, graph, ast.root(), symbol(graph, name))
        .unwrap()
        .and_then(|ty| ty.get_constant())
}

#[test]
fn test_child_scope_reuses_frame_for_same_scope() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());

    let same = root.enter_child_scope(&graph, call(&ast));
    assert!(Rc::ptr_eq(&root, &same));

    let block = find(&ast, |kind| matches!(kind, NodeKind::Block { .. }));
    let nested = root.enter_child_scope(&graph, block);
    assert!(!Rc::ptr_eq(&root, &nested));
    assert!(Rc::ptr_eq(nested.parent_chain().unwrap(), &root));
    assert_eq!(nested.scope(), graph.scope_of(block));
    assert!(nested.caller().is_none());
}

#[test]
fn test_read_and_write_through_chain() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let a = symbol(&graph, "a");

    assert!(root.scope_read(&ast, &graph, ast.root(), a).unwrap().is_none());

    root.scope_write(&ast, &graph, ast.root(), a, Type::from_value(&Value::Number(1.0)))
        .unwrap();
    let callee = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &root)
        .unwrap();
    assert_eq!(constant(&callee, &ast, &graph, "a"), Some(Value::Number(1.0)));

    // Writes from inside the callee land in the frame owning the binding
    callee
        .scope_write(&ast, &graph, ast.root(), a, Type::from_value(&Value::Number(2.0)))
        .unwrap();
    assert_eq!(constant(&root, &ast, &graph, "a"), Some(Value::Number(2.0)));
}

#[test]
fn test_callee_bindings_are_local() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let b = symbol(&graph, "b");

    let first = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &root)
        .unwrap();
    first.scope_guard(b, Type::from_value(&Value::Number(1.0)));
    let second = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &root)
        .unwrap();

    assert_eq!(constant(&first, &ast, &graph, "b"), Some(Value::Number(1.0)));
    assert_eq!(constant(&second, &ast, &graph, "b"), None);
}

#[test]
fn test_read_without_owner_is_fatal() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());

    let error = root
        .scope_read(&ast, &graph, call(&ast), symbol(&graph, "b"))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "MissingFrame");
}

#[test]
fn test_callee_must_be_newer_than_origin() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let callee = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &root)
        .unwrap();

    let error = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &callee)
        .unwrap_err();
    assert_eq!(error.get_error_name(), "ScopeGenerationOrder");
}

#[test]
fn test_guard_overlay_does_not_leak() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let a = symbol(&graph, "a");
    root.scope_write(&ast, &graph, ast.root(), a, Type::number()).unwrap();

    let guarded = root.enter_guard_scope();
    guarded.scope_guard(a, Type::from_value(&Value::Number(7.0)));
    assert_eq!(constant(&guarded, &ast, &graph, "a"), Some(Value::Number(7.0)));
    assert_eq!(constant(&root, &ast, &graph, "a"), None);

    // Writes inside the guard reach the real binding as well
    guarded
        .scope_write(&ast, &graph, ast.root(), a, Type::from_value(&Value::Number(8.0)))
        .unwrap();
    assert_eq!(constant(&guarded, &ast, &graph, "a"), Some(Value::Number(8.0)));
    assert_eq!(constant(&root, &ast, &graph, "a"), Some(Value::Number(8.0)));
}

#[test]
fn test_guard_overlay_falls_through_to_owner() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let a = symbol(&graph, "a");
    root.scope_write(&ast, &graph, ast.root(), a, Type::string()).unwrap();

    let guarded = root.enter_guard_scope();
    let read = guarded.scope_read(&ast, &graph, ast.root(), a).unwrap().unwrap();
    assert!(!read.is_not(crate::types::types::Kind::String));
}

#[test]
fn test_detect_recursion() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let f = function(&ast);

    assert!(!root.detect_recursion(f));

    let callee = root
        .enter_callee_scope(&ast, &graph, call(&ast), f, &root)
        .unwrap();
    assert!(callee.detect_recursion(f));
    assert!(callee.is_recursive());
}

#[test]
fn test_returns_collect_on_call_frame() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());

    assert!(!root.return_value(Type::number()));

    let callee = root
        .enter_callee_scope(&ast, &graph, call(&ast), function(&ast), &root)
        .unwrap();
    let body = callee.enter_guard_scope();
    assert!(body.return_value(Type::number()));
    assert!(callee.return_value(Type::string()));

    assert_eq!(callee.get_returned().len(), 2);
    assert!(root.get_returned().is_empty());
}

#[test]
fn test_trace_lists_call_boundaries() {
    let (ast, graph) = setup();
    let root = Frame::root(&graph, ast.root());
    let f = function(&ast);

    assert!(root.trace(&ast, call(&ast)).is_empty());

    let callee = root.enter_callee_scope(&ast, &graph, call(&ast), f, &root).unwrap();
    let body = ast.function(f).unwrap().body;
    let trace = callee.trace(&ast, body);

    assert_eq!(trace.len(), 2);
    assert!(trace[0].starts_with("f (stack.js:2:"));
    assert_eq!(trace[1], "stack.js:3:0");
}
