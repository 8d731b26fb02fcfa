//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable declarations
//! - Function declarations, expressions and arrows
//! - Expressions and operator precedence
//! - Control flow statements
//! - Object and array literals
//! - Error cases

use super::parser::parse;
use crate::{
    ast::{
        ast::{Ast, NodeId, NodeKind},
        expressions::{AssignOp, BinaryOp, Literal, LogicalOp, MemberKey},
        statements::{DeclKind, FunctionKind},
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Ast, Error> {
    parse(tokenize(source)?, "test.js")
}

fn body(ast: &Ast) -> Vec<NodeId> {
    match ast.kind(ast.root()) {
        NodeKind::Program { body } => body.clone(),
        other => panic!("root is not a program: {:?}", other),
    }
}

/// The expression of the first expression statement.
fn first_expr(ast: &Ast) -> NodeId {
    match ast.kind(body(ast)[0]) {
        NodeKind::ExprStmt { expr } => *expr,
        other => panic!("not an expression statement: {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let ast = parse_source("var x = 42, y;").unwrap();
    let stmts = body(&ast);

    assert_eq!(stmts.len(), 1);
    match ast.kind(stmts[0]) {
        NodeKind::VarDecl { kind, declarators } => {
            assert_eq!(*kind, DeclKind::Var);
            assert_eq!(declarators.len(), 2);
            assert!(matches!(
                ast.kind(declarators[1]),
                NodeKind::Declarator { init: None, .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_const_requires_initialiser() {
    let error = parse_source("const PI;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_function_declaration() {
    let ast = parse_source("function add(a, b) { return a + b; }").unwrap();

    let function = ast.function(body(&ast)[0]).unwrap();
    assert_eq!(function.kind, FunctionKind::Declaration);
    assert_eq!(function.name.as_deref(), Some("add"));
    assert_eq!(function.params.len(), 2);
    assert!(matches!(ast.kind(function.body), NodeKind::Block { .. }));
}

#[test]
fn test_parse_arrow_functions() {
    let ast = parse_source("var f = x => x * 2; var g = (a, b) => { return a; }; var h = () => 1;").unwrap();

    let arrows: Vec<_> = (0..ast.len() as u32)
        .map(NodeId)
        .filter_map(|id| ast.function(id))
        .collect();

    assert_eq!(arrows.len(), 3);
    assert!(arrows.iter().all(|f| f.kind == FunctionKind::Arrow));
    assert!(arrows[0].expression_body);
    assert_eq!(arrows[1].params.len(), 2);
    assert!(!arrows[1].expression_body);
    assert!(arrows[2].params.is_empty());
}

#[test]
fn test_parse_named_function_expression() {
    let ast = parse_source("var f = function fact(n) { return n; };").unwrap();

    let function = (0..ast.len() as u32)
        .map(NodeId)
        .find_map(|id| ast.function(id))
        .unwrap();
    assert_eq!(function.kind, FunctionKind::Expression);
    assert_eq!(function.name.as_deref(), Some("fact"));
}

#[test]
fn test_parse_precedence() {
    let ast = parse_source("1 + 2 * 3;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Binary { op, right, .. } => {
            assert_eq!(*op, BinaryOp::Add);
            assert!(matches!(
                ast.kind(*right),
                NodeKind::Binary { op: BinaryOp::Mul, .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_left_associative_subtraction() {
    let ast = parse_source("a - b - c;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Binary { left, right, .. } => {
            assert!(matches!(ast.kind(*left), NodeKind::Binary { .. }));
            assert!(matches!(ast.kind(*right), NodeKind::Identifier { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_logical_and_conditional() {
    let ast = parse_source("a || b && c ? 1 : 2;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Conditional { test, .. } => match ast.kind(*test) {
            NodeKind::Logical { op, right, .. } => {
                assert_eq!(*op, LogicalOp::Or);
                assert!(matches!(
                    ast.kind(*right),
                    NodeKind::Logical { op: LogicalOp::And, .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let ast = parse_source("a = b += 1;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Assign { op, value, .. } => {
            assert_eq!(*op, AssignOp::Assign);
            assert!(matches!(
                ast.kind(*value),
                NodeKind::Assign { op: AssignOp::Add, .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_invalid_assignment_target() {
    let error = parse_source("1 = 2;").unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidTarget");
}

#[test]
fn test_parse_member_and_call_chain() {
    let ast = parse_source("a.b[0](1, 2).c;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Member { object, property } => {
            assert_eq!(*property, MemberKey::Named("c".to_string()));
            match ast.kind(*object) {
                NodeKind::Call { callee, arguments } => {
                    assert_eq!(arguments.len(), 2);
                    assert!(matches!(
                        ast.kind(*callee),
                        NodeKind::Member {
                            property: MemberKey::Computed(_),
                            ..
                        }
                    ));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_new_expression() {
    let ast = parse_source("new Point(1, 2); new Thing;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::New { callee, arguments } => {
            assert!(matches!(ast.kind(*callee), NodeKind::Identifier { .. }));
            assert_eq!(arguments.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_object_literal() {
    let ast = parse_source("var o = { a: 1, 'b': 'two', 3: null, c, };").unwrap();

    let keys: Vec<String> = (0..ast.len() as u32)
        .map(NodeId)
        .filter_map(|id| match ast.kind(id) {
            NodeKind::Property { key, .. } => Some(key.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(keys, vec!["a", "b", "3", "c"]);
}

#[test]
fn test_parse_array_literal_with_trailing_comma() {
    let ast = parse_source("[1, 'a', true,];").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Array { elements } => {
            assert_eq!(elements.len(), 3);
            assert_eq!(
                ast.kind(elements[2]),
                &NodeKind::Literal(Literal::Boolean(true))
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_if_else_statement() {
    let ast = parse_source("if (x > 0) { y(); } else z();").unwrap();

    assert!(matches!(
        ast.kind(body(&ast)[0]),
        NodeKind::If {
            alternate: Some(_),
            ..
        }
    ));
}

#[test]
fn test_parse_loops() {
    let ast = parse_source("while (i < 10) { i = i + 1; } for (let j = 0; j < 3; j += 1) {} for (;;) break;").unwrap();
    let stmts = body(&ast);

    assert!(matches!(ast.kind(stmts[0]), NodeKind::While { .. }));
    assert!(matches!(
        ast.kind(stmts[1]),
        NodeKind::For {
            init: Some(_),
            test: Some(_),
            update: Some(_),
            ..
        }
    ));
    assert!(matches!(
        ast.kind(stmts[2]),
        NodeKind::For {
            init: None,
            test: None,
            update: None,
            ..
        }
    ));
}

#[test]
fn test_parse_try_catch_finally() {
    let ast = parse_source("try { f(); } catch (e) { g(e); } finally { h(); }").unwrap();

    assert!(matches!(
        ast.kind(body(&ast)[0]),
        NodeKind::Try {
            handler: Some(_),
            finalizer: Some(_),
            ..
        }
    ));
}

#[test]
fn test_parse_try_without_handler_fails() {
    assert!(parse_source("try { f(); }").is_err());
}

#[test]
fn test_parse_optional_semicolons() {
    let ast = parse_source("var a = 1\nvar b = 2\nfunction f() { return a }").unwrap();
    assert_eq!(body(&ast).len(), 3);
}

#[test]
fn test_parse_return_on_own_line() {
    let ast = parse_source("function f() { return\n1 }").unwrap();
    let function = ast.function(body(&ast)[0]).unwrap();

    match ast.kind(function.body) {
        NodeKind::Block { body } => {
            assert_eq!(body.len(), 2);
            assert!(matches!(
                ast.kind(body[0]),
                NodeKind::Return { argument: None }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_missing_semicolon_on_same_line() {
    let error = parse_source("var a = 1 var b = 2;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_parse_update_expressions_unsupported() {
    let error = parse_source("i++;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedSyntax");

    let error = parse_source("--i;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedSyntax");
}

#[test]
fn test_parse_spans_track_lines() {
    let ast = parse_source("var a;\n\nfoo(a);").unwrap();
    let span = ast.span(body(&ast)[1]);

    assert_eq!(span.start.line, 3);
    assert_eq!(span.start.column, 0);
}

#[test]
fn test_parse_sequence_expression() {
    let ast = parse_source("a = 1, b = 2;").unwrap();

    match ast.kind(first_expr(&ast)) {
        NodeKind::Sequence { expressions } => assert_eq!(expressions.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}
