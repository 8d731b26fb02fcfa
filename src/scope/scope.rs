use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Ast, NodeId, NodeKind},
        statements::{DeclKind, FunctionKind},
    },
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics},
};

/// Handle of a scope. Scopes are numbered in preorder, so a scope always has
/// a larger id than every scope enclosing it; the id doubles as the scope's
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Var,
    Let,
    Const,
    Parameter,
    Function,
    This,
    Arguments,
    Global,
}

impl SymbolKind {
    /// Implicit bindings share their function's node, so only explicit
    /// declarations are looked up by node.
    fn is_declared_by_node(self) -> bool {
        !matches!(self, SymbolKind::This | SymbolKind::Arguments | SymbolKind::Global)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Declaring node.
    pub node: NodeId,
    pub scope: ScopeId,
    pub kind: SymbolKind,
    pub mutable: bool,
    /// Value nodes written to this binding, initialiser included.
    pub writes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    /// Nearest enclosing function-level scope, `var`s land there.
    pub hoisting: ScopeId,
    pub children: Vec<ScopeId>,
    symbols: HashMap<String, SymbolId>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }
}

enum Reference {
    Read { node: NodeId, name: String },
    Write { node: NodeId, name: String, value: NodeId },
}

/// Scope tree and symbol table of one program.
///
/// The first scope holds the prelude globals and has no node of its own; the
/// program scope is its only child.
#[derive(Debug)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    node_scopes: Vec<ScopeId>,
    declarations: HashMap<NodeId, SymbolId>,
    resolutions: HashMap<NodeId, SymbolId>,
}

struct Builder<'a> {
    ast: &'a Ast,
    graph: ScopeGraph,
    references: Vec<Reference>,
    diagnostics: &'a mut Diagnostics,
}

impl ScopeGraph {
    /// Builds the scopes of `ast`, reporting unresolved reads, duplicate
    /// declarations and illegal writes into `diagnostics`.
    pub fn build(ast: &Ast, globals: &[String], diagnostics: &mut Diagnostics) -> ScopeGraph {
        let root = ast.root();
        let mut builder = Builder {
            ast,
            graph: ScopeGraph {
                scopes: vec![],
                symbols: vec![],
                node_scopes: vec![ScopeId(0); ast.len()],
                declarations: HashMap::new(),
                resolutions: HashMap::new(),
            },
            references: vec![],
            diagnostics,
        };

        let global = builder.push_scope(root, None, true);
        for name in globals {
            builder.declare(global, root, name, SymbolKind::Global);
        }

        builder.visit(root, global);
        builder.resolve();

        let graph = builder.graph;
        debug!(
            scopes = graph.scopes.len(),
            symbols = graph.symbols.len(),
            "built scope graph"
        );
        graph
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The scope active at `node`. Scope-introducing nodes map to their own
    /// scope.
    pub fn scope_of(&self, node: NodeId) -> ScopeId {
        self.node_scopes[node.index()]
    }

    /// Symbol declared by a declarator, parameter or function declaration.
    pub fn declared(&self, node: NodeId) -> Option<SymbolId> {
        self.declarations.get(&node).copied()
    }

    /// Symbol an identifier or `this` resolves to.
    pub fn resolved(&self, node: NodeId) -> Option<SymbolId> {
        self.resolutions.get(&node).copied()
    }

    /// Walks outwards from `scope` to the first scope declaring `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    pub fn local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).get(name)
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }
}

impl Builder<'_> {
    fn push_scope(&mut self, node: NodeId, parent: Option<ScopeId>, hoists: bool) -> ScopeId {
        let id = ScopeId(self.graph.scopes.len() as u32);
        let hoisting = match parent {
            Some(parent) if !hoists => self.graph.scope(parent).hoisting,
            _ => id,
        };

        self.graph.scopes.push(Scope {
            id,
            node,
            parent,
            hoisting,
            children: vec![],
            symbols: HashMap::new(),
        });
        if let Some(parent) = parent {
            self.graph.scopes[parent.index()].children.push(id);
        }

        trace!(scope = id.0, node = %node, hoists, "scope");
        id
    }

    /// Registers `name` in `scope`. A second declaration of the same name is
    /// reported and resolves to the first symbol.
    fn declare(&mut self, scope: ScopeId, node: NodeId, name: &str, kind: SymbolKind) -> SymbolId {
        if let Some(existing) = self.graph.scope(scope).get(name) {
            self.report(node, DiagnosticKind::DuplicateDeclaration { name: name.to_string() });
            if kind.is_declared_by_node() {
                self.graph.declarations.insert(node, existing);
            }
            return existing;
        }

        let id = SymbolId(self.graph.symbols.len() as u32);
        self.graph.symbols.push(Symbol {
            id,
            name: name.to_string(),
            node,
            scope,
            kind,
            mutable: !matches!(kind, SymbolKind::Const | SymbolKind::This),
            writes: vec![],
        });
        self.graph.scopes[scope.index()]
            .symbols
            .insert(name.to_string(), id);
        if kind.is_declared_by_node() {
            self.graph.declarations.insert(node, id);
        }

        trace!(name, scope = scope.0, ?kind, "symbol");
        id
    }

    fn report(&mut self, node: NodeId, kind: DiagnosticKind) {
        let location = self.ast.span(node).start.into();
        self.diagnostics.report(Diagnostic::new(location, kind, vec![]));
    }

    fn visit(&mut self, id: NodeId, scope: ScopeId) {
        let ast = self.ast;

        let scope = match ast.kind(id) {
            NodeKind::Program { .. } | NodeKind::Function(_) => self.push_scope(id, Some(scope), true),
            NodeKind::Block { .. } | NodeKind::Try { .. } | NodeKind::Catch { .. } | NodeKind::For { .. } => {
                self.push_scope(id, Some(scope), false)
            }
            _ => scope,
        };
        self.graph.node_scopes[id.index()] = scope;

        match ast.kind(id) {
            NodeKind::VarDecl { kind, declarators } => {
                for declarator in declarators {
                    let NodeKind::Declarator { name, init } = ast.kind(*declarator) else {
                        continue;
                    };
                    let (target, symbol_kind) = match kind {
                        DeclKind::Var => (self.graph.scope(scope).hoisting, SymbolKind::Var),
                        DeclKind::Let => (scope, SymbolKind::Let),
                        DeclKind::Const => (scope, SymbolKind::Const),
                    };
                    let symbol = self.declare(target, *declarator, name, symbol_kind);
                    if let Some(init) = init {
                        self.graph.symbols[symbol.index()].writes.push(*init);
                    }
                }
            }
            NodeKind::Function(function) => {
                if let (FunctionKind::Declaration, Some(name)) = (function.kind, &function.name) {
                    let enclosing = self.graph.scope(scope).parent.unwrap_or(scope);
                    let target = self.graph.scope(enclosing).hoisting;
                    let symbol = self.declare(target, id, name, SymbolKind::Function);
                    self.graph.symbols[symbol.index()].writes.push(id);
                }

                for param in &function.params {
                    if let NodeKind::Param { name } = ast.kind(*param) {
                        self.declare(scope, *param, name, SymbolKind::Parameter);
                    }
                }

                if !function.is_arrow() {
                    self.declare(scope, id, "this", SymbolKind::This);
                    if self.graph.scope(scope).get("arguments").is_none() {
                        self.declare(scope, id, "arguments", SymbolKind::Arguments);
                    }
                }

                // A named expression sees its own name, params shadow it
                if let (FunctionKind::Expression, Some(name)) = (function.kind, &function.name) {
                    if self.graph.scope(scope).get(name).is_none() {
                        self.declare(scope, id, name, SymbolKind::Function);
                    }
                }
            }
            NodeKind::Catch { param: Some(param), .. } => {
                if let NodeKind::Param { name } = ast.kind(*param) {
                    self.declare(scope, *param, name, SymbolKind::Parameter);
                }
            }
            NodeKind::Identifier { name } => self.references.push(Reference::Read {
                node: id,
                name: name.clone(),
            }),
            NodeKind::This => self.references.push(Reference::Read {
                node: id,
                name: String::from("this"),
            }),
            NodeKind::Assign { target, value, op } => {
                if let NodeKind::Identifier { name } = ast.kind(*target) {
                    let written = if op.binary().is_some() { id } else { *value };
                    self.references.push(Reference::Write {
                        node: *target,
                        name: name.clone(),
                        value: written,
                    });
                }
            }
            _ => (),
        }

        for child in ast.children(id) {
            self.visit(child, scope);
        }
    }

    /// Resolves every recorded reference once all declarations are known.
    fn resolve(&mut self) {
        let references = std::mem::take(&mut self.references);
        // Assignment targets are recorded twice: once as the write, once as
        // a plain identifier.
        let targets: HashSet<NodeId> = references
            .iter()
            .filter_map(|reference| match reference {
                Reference::Write { node, .. } => Some(*node),
                Reference::Read { .. } => None,
            })
            .collect();

        for reference in references {
            match reference {
                Reference::Read { node, name } => {
                    if targets.contains(&node) {
                        continue;
                    }
                    match self.graph.lookup(self.graph.scope_of(node), &name) {
                        Some(symbol) => {
                            self.graph.resolutions.insert(node, symbol);
                        }
                        // `this` outside any function reads as `undefined`
                        None if name == "this" => (),
                        None => self.report(node, DiagnosticKind::UnresolvedIdentifier { name }),
                    }
                }
                Reference::Write { node, name, value } => {
                    let Some(symbol) = self.graph.lookup(self.graph.scope_of(node), &name) else {
                        self.report(node, DiagnosticKind::AssignToUndeclared { name });
                        continue;
                    };

                    self.graph.resolutions.insert(node, symbol);
                    if self.graph.symbol(symbol).mutable {
                        self.graph.symbols[symbol.index()].writes.push(value);
                    } else {
                        self.report(node, DiagnosticKind::AssignToConstant { name });
                    }
                }
            }
        }
    }
}
