use std::{any::Any, collections::BTreeMap, rc::Rc};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Ast, NodeId, NodeKind},
        expressions::{AssignOp, BinaryOp, Literal, LogicalOp, MemberKey, OperatorCategory, UnaryOp},
        statements::{DeclKind, FunctionKind},
    },
    diagnostics::diagnostics::{CheckResult, Diagnostic, DiagnosticKind, Diagnostics},
    errors::errors::{Error, ErrorImpl},
    folder::folder::Folder,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::scope::{ScopeGraph, SymbolId, SymbolKind},
    stack::stack::Frame,
    types::types::{Callable, Kind, Type},
    value::value::Value,
};

use super::options::CheckOptions;

/// A function value: the function node and the frame it was created in.
#[derive(Debug)]
pub struct Closure {
    function: NodeId,
    origin: Rc<Frame>,
}

impl Callable for Closure {
    fn function(&self) -> NodeId {
        self.function
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Evaluator<'a> {
    pub ast: &'a Ast,
    pub graph: &'a ScopeGraph,
    pub folder: Folder<'a>,
    pub options: &'a CheckOptions,
    pub diagnostics: Diagnostics,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        ast: &'a Ast,
        graph: &'a ScopeGraph,
        options: &'a CheckOptions,
        diagnostics: Diagnostics,
    ) -> Self {
        Evaluator {
            ast,
            graph,
            folder: Folder::new(ast, graph),
            options,
            diagnostics,
        }
    }

    /// Evaluates the whole program and hands back its outermost frame.
    pub fn run(&mut self) -> Result<Rc<Frame>, Error> {
        let root = Frame::root(self.graph, self.ast.root());

        let global = self.graph.scope(self.graph.global_scope());
        for name in &self.options.globals {
            if let Some(symbol) = global.get(name) {
                root.scope_guard(symbol, global_type(name));
            }
        }

        evaluate_stmt(self, &root, self.ast.root())?;
        Ok(root)
    }

    pub fn report(&mut self, frame: &Frame, node: NodeId, kind: DiagnosticKind) {
        let location = self.ast.span(node).start.into();
        let trace = frame.trace(self.ast, node);
        self.diagnostics.report(Diagnostic::new(location, kind, trace));
    }

    fn unexpected(&self, node: NodeId) -> Error {
        Error::new(
            ErrorImpl::UnsupportedSyntax {
                construct: self.ast.kind(node).name().to_string(),
            },
            self.ast.span(node).start,
        )
    }

    fn missing_child(&self, node: NodeId, child: &str) -> Error {
        Error::new(
            ErrorImpl::MissingChild {
                node: self.ast.kind(node).name().to_string(),
                child: child.to_string(),
            },
            self.ast.span(node).start,
        )
    }
}

fn global_type(name: &str) -> Type {
    match name {
        "undefined" => Type::undefined(),
        "NaN" => Type::from_value(&Value::Number(f64::NAN)),
        "Infinity" => Type::from_value(&Value::Number(f64::INFINITY)),
        _ => Type::unknown(),
    }
}

/// Checks a parsed program with the default options.
pub fn check(ast: &Ast) -> Result<CheckResult, Error> {
    check_with_options(ast, &CheckOptions::default())
}

pub fn check_with_options(ast: &Ast, options: &CheckOptions) -> Result<CheckResult, Error> {
    let mut diagnostics = Diagnostics::new(options.merge_diagnostics);
    let graph = ScopeGraph::build(ast, &options.globals, &mut diagnostics);
    debug!(
        file = ast.file(),
        scopes = graph.scopes().len(),
        symbols = graph.symbols().len(),
        reported = diagnostics.len(),
        "scope graph built"
    );

    let mut evaluator = Evaluator::new(ast, &graph, options, diagnostics);
    evaluator.run()?;

    let result = evaluator.diagnostics.into_result();
    debug!(file = ast.file(), diagnostics = result.diagnostics().len(), "check finished");
    Ok(result)
}

/// Tokenizes, parses and checks `source` in one go.
pub fn check_source(source: &str, file: &str, options: &CheckOptions) -> Result<CheckResult, Error> {
    let tokens = tokenize(source)?;
    let ast = parse(tokens, file)?;
    check_with_options(&ast, options)
}

pub fn evaluate_stmt(evaluator: &mut Evaluator, frame: &Rc<Frame>, id: NodeId) -> Result<(), Error> {
    let ast = evaluator.ast;

    // Functions own a scope of their own, which is only entered through calls
    if let NodeKind::Function(function) = ast.kind(id) {
        if function.kind == FunctionKind::Declaration {
            return declare_function(evaluator, frame, id);
        }
        evaluate_expr(evaluator, frame, id)?;
        return Ok(());
    }

    let frame = frame.enter_child_scope(evaluator.graph, id);

    match ast.kind(id) {
        NodeKind::Program { body } | NodeKind::Block { body } => {
            evaluate_body(evaluator, &frame, body)?;
        }
        NodeKind::Empty | NodeKind::Break | NodeKind::Continue => {}
        NodeKind::ExprStmt { expr } => {
            evaluate_expr(evaluator, &frame, *expr)?;
        }
        NodeKind::VarDecl { kind, declarators } => {
            for declarator in declarators {
                evaluate_declarator(evaluator, &frame, *declarator, *kind)?;
            }
        }
        NodeKind::If {
            test,
            consequent,
            alternate,
        } => evaluate_if(evaluator, &frame, *test, *consequent, *alternate)?,
        NodeKind::Return { argument } => {
            let value = match argument {
                Some(argument) => evaluate_expr(evaluator, &frame, *argument)?,
                None => Type::undefined(),
            };
            if !frame.return_value(value) {
                evaluator.report(&frame, id, DiagnosticKind::UnexpectedReturn);
            }
        }
        NodeKind::While { test, body } => {
            let test = evaluate_expr(evaluator, &frame, *test)?;
            if !is_constant_false(&test) {
                evaluate_stmt(evaluator, &frame, *body)?;
            }
        }
        NodeKind::For {
            init,
            test,
            update,
            body,
        } => {
            if let Some(init) = init {
                match ast.kind(*init) {
                    NodeKind::VarDecl { .. } => evaluate_stmt(evaluator, &frame, *init)?,
                    _ => {
                        evaluate_expr(evaluator, &frame, *init)?;
                    }
                }
            }

            let skip = match test {
                Some(test) => is_constant_false(&evaluate_expr(evaluator, &frame, *test)?),
                None => false,
            };

            // One pass over the body stands in for every iteration
            if !skip {
                evaluate_stmt(evaluator, &frame, *body)?;
                if let Some(update) = update {
                    evaluate_expr(evaluator, &frame, *update)?;
                }
            }
        }
        NodeKind::Try {
            block,
            handler,
            finalizer,
        } => {
            evaluate_stmt(evaluator, &frame, *block)?;
            if let Some(handler) = handler {
                evaluate_stmt(evaluator, &frame, *handler)?;
            }
            if let Some(finalizer) = finalizer {
                evaluate_stmt(evaluator, &frame, *finalizer)?;
            }
        }
        NodeKind::Catch { param, body } => {
            if let Some(symbol) = param.and_then(|param| evaluator.graph.declared(param)) {
                frame.init_local(evaluator.graph, symbol, Type::unknown());
            }
            evaluate_stmt(evaluator, &frame, *body)?;
        }
        NodeKind::Throw { argument } => {
            evaluate_expr(evaluator, &frame, *argument)?;
        }
        NodeKind::Declarator { .. } | NodeKind::Param { .. } | NodeKind::Property { .. } => {
            return Err(evaluator.unexpected(id));
        }
        _ => {
            evaluate_expr(evaluator, &frame, id)?;
        }
    }

    Ok(())
}

/// Runs a statement list, hoisting its function declarations first.
fn evaluate_body(evaluator: &mut Evaluator, frame: &Rc<Frame>, body: &[NodeId]) -> Result<(), Error> {
    let ast = evaluator.ast;
    let is_declaration = |id: NodeId| {
        ast.function(id)
            .is_some_and(|function| function.kind == FunctionKind::Declaration)
    };

    for stmt in body.iter().filter(|stmt| is_declaration(**stmt)) {
        declare_function(evaluator, frame, *stmt)?;
    }

    for stmt in body.iter().filter(|stmt| !is_declaration(**stmt)) {
        evaluate_stmt(evaluator, frame, *stmt)?;
    }

    Ok(())
}

fn declare_function(evaluator: &mut Evaluator, frame: &Rc<Frame>, id: NodeId) -> Result<(), Error> {
    let closure = create_closure(frame, id);
    match evaluator.graph.declared(id) {
        Some(symbol) => frame.scope_write(evaluator.ast, evaluator.graph, id, symbol, closure),
        None => Ok(()),
    }
}

fn create_closure(frame: &Rc<Frame>, function: NodeId) -> Type {
    Type::function(Rc::new(Closure {
        function,
        origin: Rc::clone(frame),
    }))
}

fn evaluate_declarator(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    kind: DeclKind,
) -> Result<(), Error> {
    let NodeKind::Declarator { init, .. } = evaluator.ast.kind(id) else {
        return Err(evaluator.missing_child(id, "VariableDeclarator"));
    };
    let Some(symbol) = evaluator.graph.declared(id) else {
        return Ok(());
    };

    let value = match (init, kind) {
        (Some(init), _) => evaluate_initialiser(evaluator, frame, *init)?,
        // `var x;` keeps whatever an earlier declaration stored
        (None, DeclKind::Var) => return Ok(()),
        (None, _) => Type::undefined(),
    };

    frame.scope_write(evaluator.ast, evaluator.graph, id, symbol, value)
}

/// Evaluates the right-hand side of a binding, attaching a folded constant
/// when the evaluation alone could not produce one.
fn evaluate_initialiser(evaluator: &mut Evaluator, frame: &Rc<Frame>, node: NodeId) -> Result<Type, Error> {
    let value = evaluate_expr(evaluator, frame, node)?;
    if !evaluator.options.fold_constants || value.is_constant() || value.is_union() {
        return Ok(value);
    }

    match evaluator.folder.try_fold(node) {
        Some(folded) if folded.is_primitive() => {
            trace!(node = %node, %folded, "attached folded constant");
            Ok(value.to_constant(&folded))
        }
        _ => Ok(value),
    }
}

fn evaluate_if(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    test: NodeId,
    consequent: NodeId,
    alternate: Option<NodeId>,
) -> Result<(), Error> {
    let mut guards = vec![];
    collect_guards(evaluator, test, &mut guards);

    let outcome = evaluate_expr(evaluator, frame, test)?
        .get_constant()
        .map(|value| value.truthy());

    if outcome != Some(false) {
        let branch = if guards.is_empty() {
            Rc::clone(frame)
        } else {
            let guarded = frame.enter_guard_scope();
            for (symbol, kind) in guards {
                let current = guarded
                    .scope_read(evaluator.ast, evaluator.graph, test, symbol)?
                    .unwrap_or_else(Type::unknown);
                trace!(symbol = %evaluator.graph.symbol(symbol).name, ?kind, "narrowed");
                guarded.scope_guard(symbol, current.narrow_to(kind));
            }
            guarded
        };
        evaluate_stmt(evaluator, &branch, consequent)?;
    }

    if outcome != Some(true) {
        if let Some(alternate) = alternate {
            evaluate_stmt(evaluator, frame, alternate)?;
        }
    }

    Ok(())
}

/// Finds `typeof x === 'kind'` tests, alone or joined by `&&`.
fn collect_guards(evaluator: &Evaluator, test: NodeId, guards: &mut Vec<(SymbolId, Kind)>) {
    let ast = evaluator.ast;
    match ast.kind(test) {
        NodeKind::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            collect_guards(evaluator, *left, guards);
            collect_guards(evaluator, *right, guards);
        }
        NodeKind::Binary {
            op: BinaryOp::Eq | BinaryOp::StrictEq,
            left,
            right,
        } => {
            let (typeof_side, literal_side) = match ast.kind(*right) {
                NodeKind::Unary { .. } => (*right, *left),
                _ => (*left, *right),
            };

            let NodeKind::Unary {
                op: UnaryOp::Typeof,
                argument,
            } = ast.kind(typeof_side)
            else {
                return;
            };
            if !matches!(ast.kind(*argument), NodeKind::Identifier { .. }) {
                return;
            }
            let NodeKind::Literal(Literal::String(name)) = ast.kind(literal_side) else {
                return;
            };

            let kind = Kind::from_typeof(name).filter(|kind| kind.is_primitive());
            if let (Some(kind), Some(symbol)) = (kind, evaluator.graph.resolved(*argument)) {
                guards.push((symbol, kind));
            }
        }
        _ => {}
    }
}

fn is_constant_false(ty: &Type) -> bool {
    ty.get_constant().is_some_and(|value| !value.truthy())
}

pub fn evaluate_expr(evaluator: &mut Evaluator, frame: &Rc<Frame>, id: NodeId) -> Result<Type, Error> {
    let ast = evaluator.ast;

    let ty = match ast.kind(id) {
        NodeKind::Literal(literal) => Type::from_value(&Value::from(literal)),
        NodeKind::Identifier { .. } | NodeKind::This => read_binding(evaluator, frame, id)?,
        NodeKind::Array { elements } => Type::array(evaluate_list(evaluator, frame, elements)?),
        NodeKind::Object { properties } => {
            let mut members = BTreeMap::new();
            for property in properties {
                let NodeKind::Property { key, value } = ast.kind(*property) else {
                    return Err(evaluator.missing_child(id, "Property"));
                };
                let value = evaluate_expr(evaluator, frame, *value)?;
                members.insert(key.clone(), value);
            }
            Type::object(members)
        }
        NodeKind::Function(_) => create_closure(frame, id),
        NodeKind::Unary { op, argument } => evaluate_unary(evaluator, frame, id, *op, *argument)?,
        NodeKind::Binary { op, left, right } => {
            let left = evaluate_expr(evaluator, frame, *left)?;
            let right = evaluate_expr(evaluator, frame, *right)?;
            apply_binary(evaluator, frame, id, *op, &left, &right)
        }
        NodeKind::Logical { op, left, right } => {
            let left_type = evaluate_expr(evaluator, frame, *left)?;
            match (op, left_type.get_constant().map(|value| value.truthy())) {
                (LogicalOp::And, Some(false)) | (LogicalOp::Or, Some(true)) => left_type,
                (_, Some(_)) => evaluate_expr(evaluator, frame, *right)?,
                (_, None) => {
                    let right_type = evaluate_expr(evaluator, frame, *right)?;
                    Type::union(&left_type, &right_type)
                }
            }
        }
        NodeKind::Assign { op, target, value } => {
            evaluate_assign(evaluator, frame, id, *op, *target, *value)?
        }
        NodeKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            let test = evaluate_expr(evaluator, frame, *test)?;
            match test.get_constant().map(|value| value.truthy()) {
                Some(true) => evaluate_expr(evaluator, frame, *consequent)?,
                Some(false) => evaluate_expr(evaluator, frame, *alternate)?,
                None => {
                    let consequent = evaluate_expr(evaluator, frame, *consequent)?;
                    let alternate = evaluate_expr(evaluator, frame, *alternate)?;
                    Type::union(&consequent, &alternate)
                }
            }
        }
        NodeKind::Call { callee, arguments } => evaluate_call(evaluator, frame, id, *callee, arguments)?,
        NodeKind::New { callee, arguments } => evaluate_new(evaluator, frame, id, *callee, arguments)?,
        NodeKind::Member { object, property } => {
            let object = evaluate_expr(evaluator, frame, *object)?;
            let key = evaluate_key(evaluator, frame, property)?;
            read_member(evaluator, frame, id, &object, &key)
        }
        NodeKind::Sequence { expressions } => {
            let mut last = Type::undefined();
            for expression in expressions {
                last = evaluate_expr(evaluator, frame, *expression)?;
            }
            last
        }
        _ => return Err(evaluator.unexpected(id)),
    };

    Ok(ty)
}

fn evaluate_list(evaluator: &mut Evaluator, frame: &Rc<Frame>, nodes: &[NodeId]) -> Result<Vec<Type>, Error> {
    nodes
        .iter()
        .map(|node| evaluate_expr(evaluator, frame, *node))
        .collect()
}

fn read_binding(evaluator: &mut Evaluator, frame: &Rc<Frame>, id: NodeId) -> Result<Type, Error> {
    let Some(symbol) = evaluator.graph.resolved(id) else {
        // Unresolved names were reported while building scopes
        return Ok(match evaluator.ast.kind(id) {
            NodeKind::This => Type::undefined(),
            _ => Type::unknown(),
        });
    };

    let value = frame.scope_read(evaluator.ast, evaluator.graph, id, symbol)?;
    Ok(value.unwrap_or_else(Type::undefined))
}

fn evaluate_unary(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    op: UnaryOp,
    argument: NodeId,
) -> Result<Type, Error> {
    let argument = evaluate_expr(evaluator, frame, argument)?;

    let ty = match op {
        UnaryOp::Typeof => match argument.typeof_name() {
            Some(name) => Type::from_value(&Value::String(name.to_string())),
            None => Type::string(),
        },
        UnaryOp::Not => match argument.get_constant() {
            Some(value) => Type::from_value(&Value::Bool(!value.truthy())),
            None => Type::boolean(),
        },
        UnaryOp::Void => Type::undefined(),
        UnaryOp::Delete => Type::boolean(),
        UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => {
            if argument.is_not(Kind::Number) {
                evaluator.report(frame, id, DiagnosticKind::IncompatibleArgument { op: op.to_string() });
            }
            argument
                .get_constant()
                .and_then(|value| Value::unary(op, &value))
                .map(|value| Type::from_value(&value))
                .unwrap_or_else(Type::number)
        }
    };

    Ok(ty)
}

/// True when some variant of `ty` has a known kind outside `kinds`.
fn has_kind_outside(ty: &Type, kinds: &[Kind]) -> bool {
    ty.variants().iter().any(|variant| {
        variant
            .kind()
            .is_some_and(|kind| kind != Kind::Unknown && !kinds.contains(&kind))
    })
}

fn is_nullish(ty: &Type) -> bool {
    ty.variants()
        .iter()
        .any(|variant| matches!(variant.kind(), Some(Kind::Null | Kind::Undefined)))
}

fn is_string(ty: &Type) -> bool {
    ty.typeof_name() == Some("string")
}

/// Checks the operands of a binary operator and computes its result.
fn apply_binary(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    op: BinaryOp,
    left: &Type,
    right: &Type,
) -> Type {
    let (incompatible, general) = match op.category() {
        OperatorCategory::Addition => {
            if is_string(left) || is_string(right) {
                (false, Type::string())
            } else if left.is_not(Kind::Number) || right.is_not(Kind::Number) {
                (true, Type::unknown())
            } else {
                (false, Type::number())
            }
        }
        // `null` and `undefined` compare against anything
        OperatorCategory::Equality => (
            !is_nullish(left) && !is_nullish(right) && left.is_incompatible(right),
            Type::boolean(),
        ),
        OperatorCategory::Comparison => {
            let comparable = [Kind::Number, Kind::String];
            (
                has_kind_outside(left, &comparable)
                    || has_kind_outside(right, &comparable)
                    || left.is_incompatible(right),
                Type::boolean(),
            )
        }
        OperatorCategory::Numeric => (
            left.is_not(Kind::Number) || right.is_not(Kind::Number),
            Type::number(),
        ),
        OperatorCategory::Membership => (
            has_kind_outside(left, &[Kind::String, Kind::Number])
                || has_kind_outside(right, &[Kind::Object, Kind::Function]),
            Type::boolean(),
        ),
        OperatorCategory::Instance => (has_kind_outside(right, &[Kind::Function]), Type::boolean()),
    };

    if incompatible {
        evaluator.report(
            frame,
            id,
            DiagnosticKind::IncompatibleOperands {
                op: op.to_string(),
                left: left.to_string(),
                right: right.to_string(),
            },
        );
    }

    match (left.get_constant(), right.get_constant()) {
        (Some(left), Some(right)) => Value::binary(op, &left, &right)
            .map(|value| Type::from_value(&value))
            .unwrap_or(general),
        _ => general,
    }
}

fn evaluate_key(evaluator: &mut Evaluator, frame: &Rc<Frame>, property: &MemberKey) -> Result<Type, Error> {
    match property {
        MemberKey::Named(name) => Ok(Type::from_value(&Value::String(name.clone()))),
        MemberKey::Computed(key) => evaluate_expr(evaluator, frame, *key),
    }
}

fn read_member(evaluator: &mut Evaluator, frame: &Rc<Frame>, id: NodeId, object: &Type, key: &Type) -> Type {
    if object.does_not_have_member(key) {
        evaluator.report(
            frame,
            id,
            DiagnosticKind::MissingProperty {
                key: key.to_string(),
                object: object.to_string(),
            },
        );
        return Type::unknown();
    }

    object.get_member(key).unwrap_or_else(Type::unknown)
}

fn evaluate_assign(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    op: AssignOp,
    target: NodeId,
    value: NodeId,
) -> Result<Type, Error> {
    let ast = evaluator.ast;
    let graph = evaluator.graph;

    // Member targets evaluate their object and key ahead of the value
    let member = match ast.kind(target) {
        NodeKind::Identifier { .. } => None,
        NodeKind::Member { object, property } => {
            let object = evaluate_expr(evaluator, frame, *object)?;
            let key = evaluate_key(evaluator, frame, property)?;
            Some((object, key))
        }
        other => {
            return Err(Error::new(
                ErrorImpl::InvalidTarget {
                    node: other.name().to_string(),
                },
                ast.span(target).start,
            ))
        }
    };

    let value = match op.binary() {
        None => evaluate_initialiser(evaluator, frame, value)?,
        Some(binary) => {
            let current = match &member {
                Some((object, key)) => read_member(evaluator, frame, target, object, key),
                None => evaluate_expr(evaluator, frame, target)?,
            };
            let operand = evaluate_expr(evaluator, frame, value)?;
            apply_binary(evaluator, frame, id, binary, &current, &operand)
        }
    };

    if op == AssignOp::Assign
        && evaluator.options.report_undefined_assignment
        && value.is_kind(Kind::Undefined)
    {
        evaluator.report(frame, id, DiagnosticKind::AssignUndefined);
    }

    match member {
        None => {
            // Constant and undeclared targets were reported while building scopes
            if let Some(symbol) = graph.resolved(target) {
                if graph.symbol(symbol).mutable {
                    frame.scope_write(ast, graph, target, symbol, value.clone())?;
                }
            }
        }
        Some((object, key)) => {
            if !object.is_mutable() {
                evaluator.report(frame, id, DiagnosticKind::ImmutableAssignment);
            } else if !object.try_set_member(&key, &value) {
                evaluator.report(frame, id, DiagnosticKind::BrokenAssignment);
            }
        }
    }

    Ok(value)
}

fn evaluate_call(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    callee: NodeId,
    arguments: &[NodeId],
) -> Result<Type, Error> {
    let (this, function) = match evaluator.ast.kind(callee) {
        NodeKind::Member { object, property } => {
            let this = evaluate_expr(evaluator, frame, *object)?;
            let key = evaluate_key(evaluator, frame, property)?;
            let function = read_member(evaluator, frame, callee, &this, &key);
            (this, function)
        }
        _ => (Type::undefined(), evaluate_expr(evaluator, frame, callee)?),
    };

    let arguments = evaluate_list(evaluator, frame, arguments)?;
    invoke(evaluator, frame, id, &function, &this, &arguments)
}

fn evaluate_new(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    id: NodeId,
    callee: NodeId,
    arguments: &[NodeId],
) -> Result<Type, Error> {
    let constructor = evaluate_expr(evaluator, frame, callee)?;
    let arguments = evaluate_list(evaluator, frame, arguments)?;

    let Some(instance) = instantiate(&constructor) else {
        invoke(evaluator, frame, id, &constructor, &Type::unknown(), &arguments)?;
        return Ok(Type::unknown());
    };

    let result = invoke(evaluator, frame, id, &constructor, &instance, &arguments)?;
    let returns_object = result
        .variants()
        .iter()
        .all(|variant| matches!(variant.kind(), Some(Kind::Object | Kind::Function)));

    Ok(if returns_object { result } else { instance })
}

/// A fresh `this` for `new`, seeded with the members of the constructor's
/// `prototype`. `None` when no variant of `constructor` is a known function.
fn instantiate(constructor: &Type) -> Option<Type> {
    let function = constructor
        .variants()
        .into_iter()
        .find(|variant| variant.callable().is_some())?;

    let prototype_key = Type::from_value(&Value::String("prototype".to_string()));
    let members = function
        .get_member(&prototype_key)
        .map(|prototype| prototype.properties())
        .unwrap_or_default();

    Some(Type::object(members))
}

/// Calls every callable variant of `function` and unions the results.
fn invoke(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    site: NodeId,
    function: &Type,
    this: &Type,
    arguments: &[Type],
) -> Result<Type, Error> {
    let mut results = vec![];

    for variant in function.variants() {
        let result = match variant.callable() {
            Some(callable) => match callable.as_any().downcast_ref::<Closure>() {
                Some(closure) => call_closure(evaluator, frame, site, &variant, closure, this, arguments.to_vec())?,
                None => Type::unknown(),
            },
            None => {
                if variant.is_not(Kind::Function) {
                    evaluator.report(
                        frame,
                        site,
                        DiagnosticKind::NotCallable {
                            callee: variant.to_string(),
                        },
                    );
                }
                Type::unknown()
            }
        };
        results.push(result);
    }

    Ok(Type::union_all(&results).unwrap_or_else(Type::unknown))
}

fn call_closure(
    evaluator: &mut Evaluator,
    frame: &Rc<Frame>,
    site: NodeId,
    function_type: &Type,
    closure: &Closure,
    this: &Type,
    arguments: Vec<Type>,
) -> Result<Type, Error> {
    // Each variant of the first union argument gets a call of its own
    if let Some(index) = arguments.iter().position(Type::is_union) {
        trace!(call_site = %site, argument = index, "splitting union argument");

        let mut results = vec![];
        for variant in arguments[index].variants() {
            let mut split = arguments.clone();
            split[index] = variant;
            results.push(call_closure(evaluator, frame, site, function_type, closure, this, split)?);
        }
        return Ok(Type::union_all(&results).unwrap_or_else(Type::unknown));
    }

    if frame.detect_recursion(closure.function) {
        return Ok(Type::unknown());
    }

    let ast = evaluator.ast;
    let graph = evaluator.graph;
    let Some(function) = ast.function(closure.function) else {
        return Err(evaluator.missing_child(site, "Function"));
    };

    let callee = frame.enter_callee_scope(ast, graph, site, closure.function, &closure.origin)?;
    let scope = graph.scope_of(closure.function);

    if !function.is_arrow() {
        if let Some(symbol) = graph.local(scope, "this") {
            callee.init_local(graph, symbol, this.clone());
        }
        if let Some(symbol) = graph.local(scope, "arguments") {
            callee.init_local(graph, symbol, Type::array(arguments.clone()));
        }
    }

    // A named function expression sees itself under its own name
    if function.kind == FunctionKind::Expression {
        let own_name = function.name.as_deref().and_then(|name| graph.local(scope, name));
        if let Some(symbol) = own_name.filter(|symbol| graph.symbol(*symbol).kind == SymbolKind::Function) {
            callee.init_local(graph, symbol, function_type.clone());
        }
    }

    for (index, param) in function.params.iter().enumerate() {
        if let Some(symbol) = graph.declared(*param) {
            let argument = arguments.get(index).cloned().unwrap_or_else(Type::undefined);
            callee.init_local(graph, symbol, argument);
        }
    }

    let result = if function.expression_body {
        evaluate_expr(evaluator, &callee, function.body)?
    } else {
        evaluate_stmt(evaluator, &callee, function.body)?;
        Type::union_all(&callee.get_returned()).unwrap_or_else(Type::undefined)
    };

    if callee.is_recursive() {
        trace!(callee = %closure.function, "widening recursive result");
        return Ok(result.widen());
    }
    Ok(result)
}
