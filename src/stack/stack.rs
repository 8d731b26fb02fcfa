use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::Debug,
    rc::Rc,
};

use tracing::trace;

use crate::{
    ast::ast::{Ast, NodeId},
    errors::errors::{Error, ErrorImpl},
    scope::scope::{ScopeGraph, ScopeId, SymbolId},
    types::types::Type,
};

/// One execution context, bound to a single scope.
pub struct Frame {
    node: NodeId,
    scope: ScopeId,
    values: RefCell<HashMap<SymbolId, Type>>,
    /// Call stack link.
    parent_frame: Option<Rc<Frame>>,
    /// Lexical chain link.
    parent_chain: Option<Rc<Frame>>,
    /// Call site, set on frames entered through a call.
    caller: Option<NodeId>,
    /// Types returned so far, present on call frames only.
    returned: Option<RefCell<Vec<Type>>>,
    recursion: Cell<bool>,
    /// Guard frames shadow a few bindings of their parent's scope.
    overlay: bool,
}

impl Debug for Frame {
    // Closures bound in `values` point back at their defining frame
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("node", &self.node)
            .field("scope", &self.scope)
            .field("caller", &self.caller)
            .field("overlay", &self.overlay)
            .finish()
    }
}

impl Frame {
    /// The outermost frame of a program.
    pub fn root(graph: &ScopeGraph, program: NodeId) -> Rc<Frame> {
        Rc::new(Frame::new(program, graph.scope_of(program), None, None, None))
    }

    fn new(
        node: NodeId,
        scope: ScopeId,
        parent_frame: Option<Rc<Frame>>,
        parent_chain: Option<Rc<Frame>>,
        caller: Option<NodeId>,
    ) -> Frame {
        Frame {
            node,
            scope,
            values: RefCell::new(HashMap::new()),
            parent_frame,
            parent_chain,
            caller,
            returned: caller.map(|_| RefCell::new(vec![])),
            recursion: Cell::new(false),
            overlay: false,
        }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn caller(&self) -> Option<NodeId> {
        self.caller
    }

    pub fn is_recursive(&self) -> bool {
        self.recursion.get()
    }

    pub fn parent_chain(&self) -> Option<&Rc<Frame>> {
        self.parent_chain.as_ref()
    }

    /// Frame for evaluating `node`. Nodes sharing the current scope reuse
    /// this frame; a nested scope gets a fresh frame on the lexical chain.
    pub fn enter_child_scope(self: &Rc<Self>, graph: &ScopeGraph, node: NodeId) -> Rc<Frame> {
        let scope = graph.scope_of(node);
        if scope == self.scope {
            return Rc::clone(self);
        }

        trace!(node = %node, scope = scope.0, "enter scope");
        Rc::new(Frame::new(
            node,
            scope,
            Some(Rc::clone(self)),
            Some(Rc::clone(self)),
            None,
        ))
    }

    /// Frame for a call of `callee` from `call_site`.
    ///
    /// The new frame grows the call stack from `self` but continues the
    /// lexical chain at `origin`, the frame the callee was defined in.
    pub fn enter_callee_scope(
        self: &Rc<Self>,
        ast: &Ast,
        graph: &ScopeGraph,
        call_site: NodeId,
        callee: NodeId,
        origin: &Rc<Frame>,
    ) -> Result<Rc<Frame>, Error> {
        let scope = graph.scope_of(callee);
        if origin.scope >= scope {
            return Err(Error::new(
                ErrorImpl::ScopeGenerationOrder {
                    origin: origin.scope.index(),
                    callee: scope.index(),
                },
                ast.span(call_site).start,
            ));
        }

        trace!(call_site = %call_site, callee = %callee, "enter callee");
        Ok(Rc::new(Frame::new(
            callee,
            scope,
            Some(Rc::clone(self)),
            Some(Rc::clone(origin)),
            Some(call_site),
        )))
    }

    /// Frame holding narrowed bindings for a guarded branch. Writes made
    /// here do not outlive the branch.
    pub fn enter_guard_scope(self: &Rc<Self>) -> Rc<Frame> {
        let mut frame = Frame::new(
            self.node,
            self.scope,
            Some(Rc::clone(self)),
            Some(Rc::clone(self)),
            None,
        );
        frame.overlay = true;
        Rc::new(frame)
    }

    fn holds(&self, symbol: SymbolId) -> bool {
        self.values.borrow().contains_key(&symbol)
    }

    /// Walks the lexical chain to the frame owning `symbol`.
    fn owner(&self, graph: &ScopeGraph, symbol: SymbolId) -> Option<&Frame> {
        let owning_scope = graph.symbol(symbol).scope;
        let mut frame = self;
        loop {
            if frame.holds(symbol) || (frame.scope == owning_scope && !frame.overlay) {
                return Some(frame);
            }
            frame = frame.parent_chain.as_deref()?;
        }
    }

    fn missing(&self, graph: &ScopeGraph, symbol: SymbolId, ast: &Ast, at: NodeId) -> Error {
        Error::new(
            ErrorImpl::MissingFrame {
                symbol: graph.symbol(symbol).name.clone(),
            },
            ast.span(at).start,
        )
    }

    /// Current type of `symbol`, `None` while it has not been assigned.
    pub fn scope_read(
        &self,
        ast: &Ast,
        graph: &ScopeGraph,
        at: NodeId,
        symbol: SymbolId,
    ) -> Result<Option<Type>, Error> {
        let owner = self
            .owner(graph, symbol)
            .ok_or_else(|| self.missing(graph, symbol, ast, at))?;
        let value = owner.values.borrow().get(&symbol).cloned();
        Ok(value)
    }

    /// Rebinds `symbol` in the frame owning it. Guard frames on the way that
    /// shadow the binding see the new type too.
    pub fn scope_write(
        &self,
        ast: &Ast,
        graph: &ScopeGraph,
        at: NodeId,
        symbol: SymbolId,
        value: Type,
    ) -> Result<(), Error> {
        let owning_scope = graph.symbol(symbol).scope;
        let mut frame = self;
        loop {
            let holds = frame.holds(symbol);
            if holds || (frame.scope == owning_scope && !frame.overlay) {
                frame.values.borrow_mut().insert(symbol, value.clone());
                if !frame.overlay {
                    return Ok(());
                }
            }
            frame = frame
                .parent_chain
                .as_deref()
                .ok_or_else(|| self.missing(graph, symbol, ast, at))?;
        }
    }

    /// Binds `symbol` in this very frame, shadowing outer bindings.
    pub fn scope_guard(&self, symbol: SymbolId, value: Type) {
        self.values.borrow_mut().insert(symbol, value);
    }

    /// Initialises a binding owned by this frame's own scope.
    pub fn init_local(&self, graph: &ScopeGraph, symbol: SymbolId, value: Type) {
        debug_assert_eq!(graph.symbol(symbol).scope, self.scope);
        self.values.borrow_mut().insert(symbol, value);
    }

    /// Marks the closest call frame recursive when `callee` is already being
    /// called further up the stack.
    pub fn detect_recursion(&self, callee: NodeId) -> bool {
        let mut closest: Option<&Frame> = None;
        let mut frame = Some(self);

        while let Some(current) = frame {
            if current.caller.is_some() {
                let boundary = *closest.get_or_insert(current);
                if current.node == callee {
                    boundary.recursion.set(true);
                    trace!(callee = %callee, "recursion cut");
                    return true;
                }
            }
            frame = current.parent_frame.as_deref();
        }

        false
    }

    /// Records a returned type on the nearest call frame. Returns `false`
    /// outside any call.
    pub fn return_value(&self, value: Type) -> bool {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if let Some(returned) = &current.returned {
                returned.borrow_mut().push(value);
                return true;
            }
            frame = current.parent_chain.as_deref();
        }
        false
    }

    pub fn get_returned(&self) -> Vec<Type> {
        self.returned
            .as_ref()
            .map(|returned| returned.borrow().clone())
            .unwrap_or_default()
    }

    /// Call trace for a problem at `node`, innermost call first.
    ///
    /// Each call boundary renames the innermost entry after the callee and
    /// appends the call site, the way runtime stack traces read.
    pub fn trace(&self, ast: &Ast, node: NodeId) -> Vec<String> {
        let site = |id: NodeId| {
            let start = ast.span(id).start;
            format!("{}:{}:{}", ast.file(), start.line, start.column)
        };

        let mut trace = vec![site(node)];
        let mut calls = 0;
        let mut frame = Some(self);
        while let Some(current) = frame {
            if let Some(caller) = current.caller {
                let name = ast
                    .function(current.node)
                    .map(|function| function.display_name())
                    .unwrap_or("anon");
                if let Some(last) = trace.last_mut() {
                    *last = format!("{} ({})", name, last);
                }
                trace.push(site(caller));
                calls += 1;
            }
            frame = current.parent_frame.as_deref();
        }

        if calls == 0 {
            return vec![];
        }
        trace
    }
}
