use std::fmt::Display;

use super::ast::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclKind::Var => write!(f, "var"),
            DeclKind::Let => write!(f, "let"),
            DeclKind::Const => write!(f, "const"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
}

/// Shared shape of function declarations, function expressions and arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub kind: FunctionKind,
    pub name: Option<String>,
    /// `Param` nodes, in order.
    pub params: Vec<NodeId>,
    /// A `Block` node, or any expression node when `expression_body` is set.
    pub body: NodeId,
    pub expression_body: bool,
}

impl Function {
    pub fn is_arrow(&self) -> bool {
        self.kind == FunctionKind::Arrow
    }

    /// Name used in call traces.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anon")
    }
}
