use std::{fmt::Display, rc::Rc};

use crate::Span;

use super::{
    expressions::{AssignOp, BinaryOp, Literal, LogicalOp, MemberKey, UnaryOp},
    statements::{DeclKind, Function},
};

/// Stable handle of a node inside its [`Ast`].
///
/// Handles are plain indices into the arena, so every derived table (scopes,
/// resolutions, fold results) is keyed by them instead of living on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every node kind the checker understands.
///
/// The evaluator and scope builder match on this exhaustively, so adding a
/// kind here is a compile error until both handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Statements
    Program {
        body: Vec<NodeId>,
    },
    Block {
        body: Vec<NodeId>,
    },
    Empty,
    ExprStmt {
        expr: NodeId,
    },
    VarDecl {
        kind: DeclKind,
        declarators: Vec<NodeId>,
    },
    Declarator {
        name: String,
        init: Option<NodeId>,
    },
    If {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    Return {
        argument: Option<NodeId>,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    Try {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    Catch {
        param: Option<NodeId>,
        body: NodeId,
    },
    Throw {
        argument: NodeId,
    },
    Break,
    Continue,

    // Functions
    Function(Function),
    Param {
        name: String,
    },

    // Expressions
    Literal(Literal),
    Identifier {
        name: String,
    },
    This,
    Array {
        elements: Vec<NodeId>,
    },
    Object {
        properties: Vec<NodeId>,
    },
    Property {
        key: String,
        value: NodeId,
    },
    Unary {
        op: UnaryOp,
        argument: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Logical {
        op: LogicalOp,
        left: NodeId,
        right: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    New {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Member {
        object: NodeId,
        property: MemberKey,
    },
    Sequence {
        expressions: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Short name used in fatal error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::Block { .. } => "BlockStatement",
            NodeKind::Empty => "EmptyStatement",
            NodeKind::ExprStmt { .. } => "ExpressionStatement",
            NodeKind::VarDecl { .. } => "VariableDeclaration",
            NodeKind::Declarator { .. } => "VariableDeclarator",
            NodeKind::If { .. } => "IfStatement",
            NodeKind::Return { .. } => "ReturnStatement",
            NodeKind::While { .. } => "WhileStatement",
            NodeKind::For { .. } => "ForStatement",
            NodeKind::Try { .. } => "TryStatement",
            NodeKind::Catch { .. } => "CatchClause",
            NodeKind::Throw { .. } => "ThrowStatement",
            NodeKind::Break => "BreakStatement",
            NodeKind::Continue => "ContinueStatement",
            NodeKind::Function(_) => "Function",
            NodeKind::Param { .. } => "Parameter",
            NodeKind::Literal(_) => "Literal",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::This => "ThisExpression",
            NodeKind::Array { .. } => "ArrayExpression",
            NodeKind::Object { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::Unary { .. } => "UnaryExpression",
            NodeKind::Binary { .. } => "BinaryExpression",
            NodeKind::Logical { .. } => "LogicalExpression",
            NodeKind::Assign { .. } => "AssignmentExpression",
            NodeKind::Conditional { .. } => "ConditionalExpression",
            NodeKind::Call { .. } => "CallExpression",
            NodeKind::New { .. } => "NewExpression",
            NodeKind::Member { .. } => "MemberExpression",
            NodeKind::Sequence { .. } => "SequenceExpression",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena holding a parsed program.
///
/// Nodes are appended by the parser and never change afterwards.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    file: Rc<String>,
}

impl Ast {
    pub fn new(file: Rc<String>) -> Self {
        Ast {
            nodes: vec![],
            root: NodeId(0),
            file,
        }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// Returns the function shape if `id` is a function node.
    pub fn function(&self, id: NodeId) -> Option<&Function> {
        match self.kind(id) {
            NodeKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Program { body } | NodeKind::Block { body } => body.clone(),
            NodeKind::Empty
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Param { .. }
            | NodeKind::Literal(_)
            | NodeKind::Identifier { .. }
            | NodeKind::This => vec![],
            NodeKind::ExprStmt { expr } => vec![*expr],
            NodeKind::VarDecl { declarators, .. } => declarators.clone(),
            NodeKind::Declarator { init, .. } => init.iter().copied().collect(),
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => {
                let mut children = vec![*test, *consequent];
                children.extend(alternate);
                children
            }
            NodeKind::Return { argument } => argument.iter().copied().collect(),
            NodeKind::While { test, body } => vec![*test, *body],
            NodeKind::For {
                init,
                test,
                update,
                body,
            } => init
                .iter()
                .chain(test)
                .chain(update)
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            NodeKind::Try {
                block,
                handler,
                finalizer,
            } => std::iter::once(*block)
                .chain(handler.iter().copied())
                .chain(finalizer.iter().copied())
                .collect(),
            NodeKind::Catch { param, body } => param
                .iter()
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            NodeKind::Throw { argument } => vec![*argument],
            NodeKind::Function(function) => {
                let mut children = function.params.clone();
                children.push(function.body);
                children
            }
            NodeKind::Array { elements } => elements.clone(),
            NodeKind::Object { properties } => properties.clone(),
            NodeKind::Property { value, .. } => vec![*value],
            NodeKind::Unary { argument, .. } => vec![*argument],
            NodeKind::Binary { left, right, .. } | NodeKind::Logical { left, right, .. } => {
                vec![*left, *right]
            }
            NodeKind::Assign { target, value, .. } => vec![*target, *value],
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => vec![*test, *consequent, *alternate],
            NodeKind::Call { callee, arguments } | NodeKind::New { callee, arguments } => {
                let mut children = vec![*callee];
                children.extend(arguments);
                children
            }
            NodeKind::Member { object, property } => match property {
                MemberKey::Named(_) => vec![*object],
                MemberKey::Computed(key) => vec![*object, *key],
            },
            NodeKind::Sequence { expressions } => expressions.clone(),
        }
    }
}
