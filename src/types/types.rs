use std::{
    any::Any,
    cell::RefCell,
    collections::BTreeMap,
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::{ast::ast::NodeId, value::value::Value};

/// Nesting limit for structural comparisons and merges. Objects may refer to
/// themselves, so walks past this depth give up and answer permissively.
pub const MAX_STRUCTURAL_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Object,
    Function,
    Unknown,
}

impl Kind {
    /// Kind named by a `typeof` result string.
    pub fn from_typeof(name: &str) -> Option<Kind> {
        match name {
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "boolean" => Some(Kind::Boolean),
            "undefined" => Some(Kind::Undefined),
            "object" => Some(Kind::Object),
            "function" => Some(Kind::Function),
            _ => None,
        }
    }

    /// What `typeof` yields for values of this kind.
    pub fn typeof_name(&self) -> Option<&'static str> {
        match self {
            Kind::String => Some("string"),
            Kind::Number => Some("number"),
            Kind::Boolean => Some("boolean"),
            Kind::Null | Kind::Object => Some("object"),
            Kind::Undefined => Some("undefined"),
            Kind::Function => Some("function"),
            Kind::Unknown => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Kind::String | Kind::Number | Kind::Boolean | Kind::Null | Kind::Undefined
        )
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Object => "object",
            Kind::Function => "function",
            Kind::Unknown => "any",
        };
        write!(f, "{}", name)
    }
}

/// Something that can be invoked during evaluation.
///
/// The lattice only stores these; the evaluator owns the concrete closure
/// type and recovers it with `as_any`.
pub trait Callable: Debug {
    /// The function node this callable evaluates.
    fn function(&self) -> NodeId;
    /// Type conversion purposes - used with `.downcast_ref<T>()`
    fn as_any(&self) -> &dyn Any;
}

/// Key/element pair of an indexable type.
#[derive(Debug, Clone)]
pub struct Indexer {
    pub key: Type,
    /// `None` when nothing is known about the elements.
    pub element: Option<Type>,
}

#[derive(Debug)]
pub struct BaseType {
    kind: Kind,
    mutable: bool,
    /// Open types tolerate reads of undeclared members.
    open: bool,
    indexer: Option<Indexer>,
    properties: RefCell<Option<BTreeMap<String, Type>>>,
    constant: RefCell<Option<Value>>,
    callable: Option<Rc<dyn Callable>>,
}

impl BaseType {
    fn new(kind: Kind) -> Self {
        BaseType {
            kind,
            mutable: false,
            open: false,
            indexer: None,
            properties: RefCell::new(None),
            constant: RefCell::new(None),
            callable: None,
        }
    }

    fn duplicate(&self) -> Self {
        BaseType {
            kind: self.kind,
            mutable: self.mutable,
            open: self.open,
            indexer: self.indexer.clone(),
            properties: RefCell::new(self.properties.borrow().clone()),
            constant: RefCell::new(self.constant.borrow().clone()),
            callable: self.callable.clone(),
        }
    }

    fn is_array(&self) -> bool {
        self.kind == Kind::Object
            && self
                .indexer
                .as_ref()
                .is_some_and(|indexer| indexer.key.is_kind(Kind::Number))
    }

    /// Declared property, materialising it from the constant on first use.
    fn property(&self, key: &str) -> Option<Type> {
        if let Some(found) = self
            .properties
            .borrow()
            .as_ref()
            .and_then(|properties| properties.get(key).cloned())
        {
            return Some(found);
        }

        if !matches!(self.kind, Kind::Object | Kind::Function) {
            return None;
        }

        let constant = self.constant.borrow().clone()?;
        let materialised = Type::from_value(&constant.get(key)?);
        // Array elements follow the constant, only object members are cached
        if !matches!(constant, Value::Object(_)) {
            return Some(materialised);
        }
        self.properties
            .borrow_mut()
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), materialised.clone());
        Some(materialised)
    }

    /// Members every value of this kind exposes.
    fn builtin(&self, key: &str) -> Option<Type> {
        let has_length = self.kind == Kind::String || self.is_array();
        if key != "length" || !has_length {
            return None;
        }

        match self.constant.borrow().as_ref().and_then(|value| value.get(key)) {
            Some(length) => Some(Type::from_value(&length)),
            None => Some(Type::number()),
        }
    }

    fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .properties
            .borrow()
            .as_ref()
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();

        if let Some(Value::Object(object)) = self.constant.borrow().as_ref() {
            for key in object.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        names
    }
}

/// A statically approximated set of runtime values.
///
/// Unions are always flat: no member of a `Union` is itself a union.
#[derive(Debug, Clone)]
pub enum Type {
    Base(Rc<BaseType>),
    Union(Rc<Vec<Type>>),
}

impl Type {
    fn from_base(base: BaseType) -> Type {
        Type::Base(Rc::new(base))
    }

    pub fn unknown() -> Type {
        let mut base = BaseType::new(Kind::Unknown);
        base.mutable = true;
        base.open = true;
        Type::from_base(base)
    }

    pub fn number() -> Type {
        let mut base = BaseType::new(Kind::Number);
        base.open = true;
        Type::from_base(base)
    }

    pub fn string() -> Type {
        let mut base = BaseType::new(Kind::String);
        base.open = true;
        base.indexer = Some(Indexer {
            key: Type::number(),
            element: Some(Type::from_base({
                let mut element = BaseType::new(Kind::String);
                element.open = true;
                element
            })),
        });
        Type::from_base(base)
    }

    pub fn boolean() -> Type {
        Type::from_base(BaseType::new(Kind::Boolean))
    }

    pub fn null() -> Type {
        let base = BaseType::new(Kind::Null);
        *base.constant.borrow_mut() = Some(Value::Null);
        Type::from_base(base)
    }

    pub fn undefined() -> Type {
        let base = BaseType::new(Kind::Undefined);
        *base.constant.borrow_mut() = Some(Value::Undefined);
        Type::from_base(base)
    }

    /// A plain mutable object with the given properties.
    ///
    /// The object is constant when every property is.
    pub fn object(properties: BTreeMap<String, Type>) -> Type {
        let constant: Option<BTreeMap<String, Value>> = properties
            .iter()
            .map(|(key, value)| value.get_constant().map(|constant| (key.clone(), constant)))
            .collect();

        let mut base = BaseType::new(Kind::Object);
        base.mutable = true;
        base.indexer = Some(Indexer {
            key: Type::string(),
            element: None,
        });
        *base.properties.borrow_mut() = Some(properties);
        *base.constant.borrow_mut() = constant.map(|constant| Value::Object(Rc::new(constant)));
        Type::from_base(base)
    }

    /// A mutable array whose element type is the widened union of `elements`.
    ///
    /// Arrays are open so their built-in methods can be read.
    pub fn array(elements: Vec<Type>) -> Type {
        let constant: Option<Vec<Value>> = elements.iter().map(Type::get_constant).collect();
        let element = elements
            .iter()
            .map(Type::widen)
            .reduce(|union, next| Type::union(&union, &next));

        let mut base = BaseType::new(Kind::Object);
        base.mutable = true;
        base.open = true;
        base.indexer = Some(Indexer {
            key: Type::number(),
            element,
        });
        *base.constant.borrow_mut() = constant.map(|constant| Value::Array(Rc::new(constant)));
        Type::from_base(base)
    }

    /// A function type carrying a fresh, mutable `prototype` object.
    ///
    /// Functions are open, `call`/`apply`/`bind` and friends are not modelled.
    pub fn function(callable: Rc<dyn Callable>) -> Type {
        let mut base = BaseType::new(Kind::Function);
        base.mutable = true;
        base.open = true;
        base.callable = Some(callable);

        let mut properties = BTreeMap::new();
        properties.insert(String::from("prototype"), Type::object(BTreeMap::new()));
        *base.properties.borrow_mut() = Some(properties);
        Type::from_base(base)
    }

    /// The general, non-constant type of a kind.
    pub fn of_kind(kind: Kind) -> Type {
        match kind {
            Kind::String => Type::string(),
            Kind::Number => Type::number(),
            Kind::Boolean => Type::boolean(),
            Kind::Null => Type::null(),
            Kind::Undefined => Type::undefined(),
            Kind::Object => Type::object(BTreeMap::new()),
            Kind::Function | Kind::Unknown => Type::unknown(),
        }
    }

    /// The constant type of a concrete value.
    ///
    /// Object and array members are materialised lazily on access.
    pub fn from_value(value: &Value) -> Type {
        match value {
            Value::Null => Type::null(),
            Value::Undefined => Type::undefined(),
            Value::Array(elements) => {
                let element_types = elements.iter().map(Type::from_value).collect();
                Type::array(element_types)
            }
            Value::Object(_) => {
                let base = {
                    let mut base = BaseType::new(Kind::Object);
                    base.mutable = true;
                    base.indexer = Some(Indexer {
                        key: Type::string(),
                        element: None,
                    });
                    base
                };
                *base.constant.borrow_mut() = Some(value.clone());
                Type::from_base(base)
            }
            Value::Bool(_) => Type::boolean().to_constant(value),
            Value::Number(_) => Type::number().to_constant(value),
            Value::String(_) => Type::string().to_constant(value),
        }
    }

    // Inspection

    pub fn base(&self) -> Option<&BaseType> {
        match self {
            Type::Base(base) => Some(base),
            Type::Union(_) => None,
        }
    }

    /// Kind of a plain type; `None` for unions.
    pub fn kind(&self) -> Option<Kind> {
        self.base().map(|base| base.kind)
    }

    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn is_unknown(&self) -> bool {
        self.is_kind(Kind::Unknown)
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(_))
    }

    pub fn is_array(&self) -> bool {
        self.base().is_some_and(BaseType::is_array)
    }

    /// The members of a union, or the type itself.
    pub fn variants(&self) -> Vec<Type> {
        match self {
            Type::Base(_) => vec![self.clone()],
            Type::Union(variants) => variants.as_ref().clone(),
        }
    }

    /// `true` when the type is known to be of some other kind than `kind`.
    /// Unknown types are never "not" anything.
    pub fn is_not(&self, kind: Kind) -> bool {
        match self {
            Type::Base(base) => base.kind != Kind::Unknown && base.kind != kind,
            Type::Union(variants) => variants.iter().any(|variant| variant.is_not(kind)),
        }
    }

    pub fn is_mutable(&self) -> bool {
        match self {
            Type::Base(base) => base.mutable,
            Type::Union(variants) => variants.iter().all(Type::is_mutable),
        }
    }

    pub fn callable(&self) -> Option<Rc<dyn Callable>> {
        self.base().and_then(|base| base.callable.clone())
    }

    /// The `typeof` string shared by every value of this type, if any.
    pub fn typeof_name(&self) -> Option<&'static str> {
        match self {
            Type::Base(base) => base.kind.typeof_name(),
            Type::Union(variants) => {
                let mut names = variants.iter().map(Type::typeof_name);
                let first = names.next()??;
                names.all(|name| name == Some(first)).then_some(first)
            }
        }
    }

    // Constants

    pub fn is_constant(&self) -> bool {
        self.base()
            .is_some_and(|base| base.constant.borrow().is_some())
    }

    pub fn get_constant(&self) -> Option<Value> {
        self.base().and_then(|base| base.constant.borrow().clone())
    }

    /// A copy of this type pinned to `value`.
    ///
    /// Falls back to the value's own type when the kinds disagree.
    pub fn to_constant(&self, value: &Value) -> Type {
        let matches_kind = match (self.kind(), value) {
            (Some(Kind::String), Value::String(_))
            | (Some(Kind::Number), Value::Number(_))
            | (Some(Kind::Boolean), Value::Bool(_)) => true,
            (Some(Kind::Object), Value::Object(_) | Value::Array(_)) => true,
            _ => false,
        };

        match (self, matches_kind) {
            (Type::Base(base), true) => {
                let copy = base.duplicate();
                *copy.constant.borrow_mut() = Some(value.clone());
                Type::from_base(copy)
            }
            _ => Type::from_value(value),
        }
    }

    /// An immutable copy; no program value starts out frozen.
    #[cfg(test)]
    pub(crate) fn to_immutable(&self) -> Type {
        match self {
            Type::Base(base) => {
                let mut copy = base.duplicate();
                copy.mutable = false;
                Type::from_base(copy)
            }
            Type::Union(_) => self.clone(),
        }
    }

    /// Drops any constant, keeping the structural shape.
    pub fn widen(&self) -> Type {
        match self {
            Type::Base(base) if base.constant.borrow().is_some() => {
                if matches!(base.kind, Kind::Null | Kind::Undefined) {
                    return self.clone();
                }
                let copy = base.duplicate();
                *copy.constant.borrow_mut() = None;
                Type::from_base(copy)
            }
            Type::Base(_) => self.clone(),
            Type::Union(variants) => variants
                .iter()
                .map(Type::widen)
                .reduce(|union, next| Type::union(&union, &next))
                .unwrap_or_else(Type::unknown),
        }
    }

    // Assignability

    /// `true` when a value of type `other` may not stand in for `self`.
    pub fn is_not_assignable(&self, other: &Type) -> bool {
        !self.is_assignable_at(other, 0)
    }

    /// `true` when neither side is assignable to the other.
    pub fn is_incompatible(&self, other: &Type) -> bool {
        self.is_not_assignable(other) && other.is_not_assignable(self)
    }

    /// `true` unless both sides are assignable to each other.
    pub fn is_not_equal(&self, other: &Type) -> bool {
        self.is_not_assignable(other) || other.is_not_assignable(self)
    }

    fn is_assignable_at(&self, other: &Type, depth: usize) -> bool {
        if depth > MAX_STRUCTURAL_DEPTH {
            return true;
        }

        let (target, source) = match (self, other) {
            (_, Type::Union(variants)) => {
                return variants
                    .iter()
                    .all(|variant| self.is_assignable_at(variant, depth + 1))
            }
            (Type::Union(variants), _) => {
                return variants
                    .iter()
                    .any(|variant| variant.is_assignable_at(other, depth + 1))
            }
            (Type::Base(target), Type::Base(source)) => (target, source),
        };

        if Rc::ptr_eq(target, source) {
            return true;
        }
        if target.kind == Kind::Unknown || source.kind == Kind::Unknown {
            return true;
        }
        if target.kind != source.kind {
            return false;
        }
        if target.mutable && !source.mutable {
            return false;
        }

        // Every string shares one shape, only object elements are compared
        if let (
            Kind::Object,
            Some(Indexer {
                element: Some(expected),
                ..
            }),
        ) = (target.kind, &target.indexer)
        {
            match &source.indexer {
                None => return false,
                Some(Indexer {
                    element: Some(actual),
                    ..
                }) => {
                    if !expected.is_assignable_at(actual, depth + 1) {
                        return false;
                    }
                }
                Some(_) => (),
            }
        }

        for key in target.property_names() {
            let (Some(expected), Some(actual)) = (target.property(&key), source.property(&key)) else {
                return false;
            };
            if !expected.is_assignable_at(&actual, depth + 1) {
                return false;
            }
        }

        true
    }

    // Unions

    /// Joins two types.
    ///
    /// Mutually assignable types collapse into one; anything else becomes a
    /// flat union. Distinct functions always stay separate so calls can reach
    /// each of them.
    pub fn union(a: &Type, b: &Type) -> Type {
        if a.is_unknown() || b.is_unknown() {
            return Type::unknown();
        }

        let mut variants: Vec<Type> = a.variants();
        for incoming in b.variants() {
            let merged = variants
                .iter()
                .enumerate()
                .find_map(|(index, existing)| merge(existing, &incoming, 0).map(|merged| (index, merged)));

            match merged {
                Some((index, merged)) => variants[index] = merged,
                None => variants.push(incoming),
            }
        }

        if variants.len() == 1 {
            return variants.remove(0);
        }
        Type::Union(Rc::new(variants))
    }

    /// Union of a list, `None` when the list is empty.
    pub fn union_all(types: &[Type]) -> Option<Type> {
        types.iter().cloned().reduce(|union, next| Type::union(&union, &next))
    }

    // Members

    /// Type of `self[key]`, or `None` when the member cannot be resolved.
    pub fn get_member(&self, key: &Type) -> Option<Type> {
        let base = match self {
            Type::Union(variants) => {
                let members: Vec<Type> = variants
                    .iter()
                    .map(|variant| variant.get_member(key).unwrap_or_else(Type::unknown))
                    .collect();
                return Type::union_all(&members);
            }
            Type::Base(base) => base,
        };

        if base.kind == Kind::Unknown {
            return Some(Type::unknown());
        }

        if let Some(name) = key.constant_key() {
            if let Some(member) = base.property(&name).or_else(|| base.builtin(&name)) {
                return Some(member);
            }
            if base.kind == Kind::String {
                if let Some(found) = base.constant.borrow().as_ref().and_then(|value| value.get(&name)) {
                    return Some(Type::from_value(&found));
                }
            }
        }

        match &base.indexer {
            Some(indexer) if indexer.key.is_assignable_at(key, 0) => {
                Some(indexer.element.clone().unwrap_or_else(Type::unknown))
            }
            _ => None,
        }
    }

    /// `true` when reading `self[key]` is an error.
    pub fn does_not_have_member(&self, key: &Type) -> bool {
        let base = match self {
            Type::Union(variants) => {
                return variants
                    .iter()
                    .any(|variant| variant.does_not_have_member(key))
            }
            Type::Base(base) => base,
        };

        match base.kind {
            Kind::Unknown => return false,
            Kind::Null | Kind::Undefined => return true,
            _ => (),
        }

        if key.is_kind(Kind::String) {
            if let Some(name) = key.constant_key() {
                if base.property(&name).is_none() && base.builtin(&name).is_none() {
                    return !base.open;
                }
                return false;
            }
        }

        if let Some(name) = key.constant_key() {
            if base.property(&name).is_some() || base.builtin(&name).is_some() {
                return false;
            }
        }

        match &base.indexer {
            Some(indexer) => indexer.key.is_not_assignable(key),
            None => false,
        }
    }

    /// Attempts `self[key] = value`, returning `false` when the target
    /// cannot be written.
    pub fn try_set_member(&self, key: &Type, value: &Type) -> bool {
        let base = match self {
            Type::Union(variants) => {
                return variants
                    .iter()
                    .fold(true, |ok, variant| variant.try_set_member(key, value) && ok)
            }
            Type::Base(base) => base,
        };

        if base.kind == Kind::Unknown {
            return true;
        }
        if !base.mutable {
            return false;
        }

        if key.is_kind(Kind::String) {
            if let Some(name) = key.constant_key() {
                self.set_property(&name, value.clone());
                return true;
            }
        }

        if let Some(indexer) = &base.indexer {
            if indexer.key.is_not_assignable(key) {
                return false;
            }
        }

        // Computed writes keep the shape but invalidate the constant
        *base.constant.borrow_mut() = None;
        true
    }

    /// Declares or overwrites a property, keeping the constant in step.
    pub fn set_property(&self, key: &str, value: Type) {
        let Some(base) = self.base() else {
            return;
        };

        let member = value.get_constant();
        let mut constant = base.constant.borrow_mut();
        let updated = match (constant.take(), member) {
            (Some(Value::Object(object)), Some(member)) => {
                let mut object = object.as_ref().clone();
                object.insert(key.to_string(), member);
                Some(Value::Object(Rc::new(object)))
            }
            _ => None,
        };
        *constant = updated;
        drop(constant);

        base.properties
            .borrow_mut()
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value);
    }

    /// Snapshot of the declared properties.
    pub fn properties(&self) -> BTreeMap<String, Type> {
        let Some(base) = self.base() else {
            return BTreeMap::new();
        };

        base.property_names()
            .into_iter()
            .filter_map(|name| base.property(&name).map(|member| (name, member)))
            .collect()
    }

    /// The type narrowed to values of `kind`, as a `typeof` guard sees it.
    pub fn narrow_to(&self, kind: Kind) -> Type {
        let matching: Vec<Type> = self
            .variants()
            .into_iter()
            .filter(|variant| variant.is_kind(kind))
            .collect();

        Type::union_all(&matching).unwrap_or_else(|| Type::of_kind(kind))
    }

    /// String form of a constant key, used for property lookups.
    fn constant_key(&self) -> Option<String> {
        match self.get_constant()? {
            Value::String(name) => Some(name),
            Value::Number(_) => Some(self.get_constant()?.to_js_string()),
            _ => None,
        }
    }
}

/// Merges `incoming` into `existing` when they describe the same values.
fn merge(existing: &Type, incoming: &Type, depth: usize) -> Option<Type> {
    let (Type::Base(a), Type::Base(b)) = (existing, incoming) else {
        return None;
    };

    if Rc::ptr_eq(a, b) {
        return Some(existing.clone());
    }
    if a.kind == Kind::Unknown || b.kind == Kind::Unknown {
        return Some(Type::unknown());
    }

    if let (Some(left), Some(right)) = (&a.callable, &b.callable) {
        if !same_callable(left, right) {
            return None;
        }
    }

    if existing.is_not_equal(incoming) {
        return None;
    }

    let same_constant = *a.constant.borrow() == *b.constant.borrow();
    if same_constant {
        return Some(existing.clone());
    }

    if a.kind.is_primitive() || depth > MAX_STRUCTURAL_DEPTH {
        return Some(existing.widen());
    }

    // Objects with differing contents: join member by member
    let merged = a.duplicate();
    *merged.constant.borrow_mut() = None;
    let mut properties = BTreeMap::new();
    for key in a.property_names() {
        let joined = match (a.property(&key), b.property(&key)) {
            (Some(left), Some(right)) => match merge(&left, &right, depth + 1) {
                Some(joined) => joined,
                None => Type::union(&left, &right),
            },
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => continue,
        };
        properties.insert(key, joined);
    }
    *merged.properties.borrow_mut() = Some(properties);

    Some(Type::from_base(merged))
}

fn same_callable(a: &Rc<dyn Callable>, b: &Rc<dyn Callable>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Union(variants) => {
                let names: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", names.join(" | "))
            }
            Type::Base(base) => {
                if let Some(constant) = base.constant.borrow().as_ref() {
                    return write!(f, "{}", constant);
                }
                if base.is_array() {
                    return write!(f, "`array`");
                }
                write!(f, "`{}`", base.kind)
            }
        }
    }
}
