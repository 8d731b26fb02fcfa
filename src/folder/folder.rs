use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
};

use tracing::trace;

use crate::{
    ast::{
        ast::{Ast, NodeId, NodeKind},
        expressions::{BinaryOp, LogicalOp, MemberKey, OperatorCategory, UnaryOp},
    },
    scope::scope::{ScopeGraph, SymbolKind},
    value::value::Value,
};

/// Memoising constant folder.
///
/// Results are cached per node, so repeated visits during evaluation are
/// cheap. Bindings only fold when they are written exactly once.
pub struct Folder<'a> {
    ast: &'a Ast,
    graph: &'a ScopeGraph,
    cache: RefCell<HashMap<NodeId, Option<Value>>>,
    in_progress: RefCell<HashSet<NodeId>>,
}

impl<'a> Folder<'a> {
    pub fn new(ast: &'a Ast, graph: &'a ScopeGraph) -> Self {
        Folder {
            ast,
            graph,
            cache: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
        }
    }

    /// The value of `node`, or `None` when it cannot be computed statically.
    pub fn try_fold(&self, node: NodeId) -> Option<Value> {
        if let Some(cached) = self.cache.borrow().get(&node) {
            return cached.clone();
        }

        // Bindings initialised from each other would otherwise loop
        if !self.in_progress.borrow_mut().insert(node) {
            return None;
        }
        let value = self.fold(node);
        self.in_progress.borrow_mut().remove(&node);

        if let Some(value) = &value {
            trace!(node = %node, %value, "folded");
        }
        self.cache.borrow_mut().insert(node, value.clone());
        value
    }

    fn fold(&self, node: NodeId) -> Option<Value> {
        match self.ast.kind(node) {
            NodeKind::Literal(literal) => Some(Value::from(literal)),
            NodeKind::Identifier { .. } => self.fold_identifier(node),
            NodeKind::Unary { op, argument } => {
                let value = self.try_fold(*argument)?;
                match op {
                    UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot
                        if !matches!(value, Value::Number(_)) =>
                    {
                        None
                    }
                    _ => Value::unary(*op, &value),
                }
            }
            NodeKind::Logical { op, left, right } => {
                let left_value = self.try_fold(*left)?;
                match (op, left_value.truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Some(left_value),
                    _ => self.try_fold(*right),
                }
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.try_fold(*left)?;
                let right = self.try_fold(*right)?;
                fold_binary(*op, &left, &right)
            }
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.try_fold(*test)?.truthy() {
                    self.try_fold(*consequent)
                } else {
                    self.try_fold(*alternate)
                }
            }
            NodeKind::Array { elements } => {
                let values = elements
                    .iter()
                    .map(|element| self.try_fold(*element))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::Array(Rc::new(values)))
            }
            NodeKind::Object { properties } => {
                let mut object = BTreeMap::new();
                for property in properties {
                    let NodeKind::Property { key, value } = self.ast.kind(*property) else {
                        return None;
                    };
                    object.insert(key.clone(), self.try_fold(*value)?);
                }
                Some(Value::Object(Rc::new(object)))
            }
            NodeKind::Member { object, property } => {
                let object = self.try_fold(*object)?;
                let key = match property {
                    MemberKey::Named(name) => name.clone(),
                    MemberKey::Computed(key) => self.try_fold(*key)?.to_js_string(),
                };
                object.get(&key)
            }
            _ => None,
        }
    }

    /// Folds a declared variable through its only write. Only primitives are
    /// shared this way since objects may be mutated through any alias.
    ///
    /// Parameters and other implicit bindings receive a value on entry that
    /// is not a recorded write, so they never fold.
    fn fold_identifier(&self, node: NodeId) -> Option<Value> {
        let symbol = self.graph.symbol(self.graph.resolved(node)?);
        if !matches!(symbol.kind, SymbolKind::Var | SymbolKind::Let | SymbolKind::Const) {
            return None;
        }
        let [write] = symbol.writes.as_slice() else {
            return None;
        };

        let value = self.try_fold(*write)?;
        value.is_primitive().then_some(value)
    }
}

/// Applies `op` when the operand kinds make sense for it.
fn fold_binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    let is_text = |value: &Value| matches!(value, Value::Number(_) | Value::String(_));

    match op.category() {
        OperatorCategory::Equality if left.type_name() != right.type_name() => return None,
        OperatorCategory::Addition | OperatorCategory::Comparison
            if !is_text(left) || !is_text(right) =>
        {
            return None
        }
        OperatorCategory::Numeric
            if !matches!((left, right), (Value::Number(_), Value::Number(_))) =>
        {
            return None
        }
        _ => (),
    }

    Value::binary(op, left, right)
}
