use std::{collections::BTreeMap, fmt::Display, rc::Rc};

use crate::ast::expressions::{BinaryOp, Literal, UnaryOp};

/// A concrete runtime value, as far as the checker can know one statically.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(number) => Value::Number(*number),
            Literal::String(string) => Value::String(string.clone()),
            Literal::Boolean(boolean) => Value::Bool(*boolean),
            Literal::Null => Value::Null,
        }
    }
}

impl Value {
    /// Result of `typeof` on this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(boolean) => *boolean,
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::String(string) => !string.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(boolean) => {
                if *boolean {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(number) => *number,
            Value::String(string) => string_to_number(string),
            Value::Array(_) | Value::Object(_) => string_to_number(&self.to_js_string()),
        }
    }

    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => String::from("undefined"),
            Value::Null => String::from("null"),
            Value::Bool(boolean) => boolean.to_string(),
            Value::Number(number) => number_to_string(*number),
            Value::String(string) => string.clone(),
            Value::Array(elements) => elements
                .iter()
                .map(|element| match element {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => String::from("[object Object]"),
        }
    }

    fn to_primitive(&self) -> Value {
        if self.is_primitive() {
            self.clone()
        } else {
            Value::String(self.to_js_string())
        }
    }

    /// Property read on a constant, `None` when the property does not exist.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(properties) => properties.get(key).cloned(),
            Value::Array(elements) => {
                if key == "length" {
                    return Some(Value::Number(elements.len() as f64));
                }
                array_index(key).and_then(|index| elements.get(index).cloned())
            }
            Value::String(string) => {
                if key == "length" {
                    return Some(Value::Number(string.encode_utf16().count() as f64));
                }
                array_index(key)
                    .and_then(|index| string.chars().nth(index))
                    .map(|ch| Value::String(ch.to_string()))
            }
            _ => None,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (a, b) if a.type_name() == b.type_name() && a.is_primitive() == b.is_primitive() => {
                a.strict_equals(b)
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Number(a), Value::String(_)) => *a == other.to_number(),
            (Value::String(_), Value::Number(b)) => self.to_number() == *b,
            (a, b) if !a.is_primitive() && b.is_primitive() => a.to_primitive().loose_equals(b),
            (a, b) if a.is_primitive() && !b.is_primitive() => a.loose_equals(&b.to_primitive()),
            _ => false,
        }
    }

    fn compare(&self, other: &Value, op: BinaryOp) -> bool {
        let left = self.to_primitive();
        let right = other.to_primitive();

        if let (Value::String(a), Value::String(b)) = (&left, &right) {
            return match op {
                BinaryOp::Less => a < b,
                BinaryOp::LessEq => a <= b,
                BinaryOp::Greater => a > b,
                _ => a >= b,
            };
        }

        let (a, b) = (left.to_number(), right.to_number());
        match op {
            BinaryOp::Less => a < b,
            BinaryOp::LessEq => a <= b,
            BinaryOp::Greater => a > b,
            _ => a >= b,
        }
    }

    /// Applies a binary operator with JavaScript semantics.
    ///
    /// Returns `None` for operators that depend on runtime identity or
    /// prototypes (`in`, `instanceof`).
    pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
        let number = |f: fn(f64, f64) -> f64| Some(Value::Number(f(left.to_number(), right.to_number())));
        let int32 = |f: fn(i32, i32) -> i32| {
            Some(Value::Number(
                f(to_int32(left.to_number()), to_int32(right.to_number())) as f64,
            ))
        };

        match op {
            BinaryOp::Add => {
                let (l, r) = (left.to_primitive(), right.to_primitive());
                if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                    Some(Value::String(l.to_js_string() + &r.to_js_string()))
                } else {
                    Some(Value::Number(l.to_number() + r.to_number()))
                }
            }
            BinaryOp::Sub => number(|a, b| a - b),
            BinaryOp::Mul => number(|a, b| a * b),
            BinaryOp::Div => number(|a, b| a / b),
            BinaryOp::Rem => number(|a, b| a % b),
            BinaryOp::Pow => number(f64::powf),

            BinaryOp::Eq => Some(Value::Bool(left.loose_equals(right))),
            BinaryOp::NotEq => Some(Value::Bool(!left.loose_equals(right))),
            BinaryOp::StrictEq => Some(Value::Bool(left.strict_equals(right))),
            BinaryOp::StrictNotEq => Some(Value::Bool(!left.strict_equals(right))),

            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                Some(Value::Bool(left.compare(right, op)))
            }

            BinaryOp::BitAnd => int32(|a, b| a & b),
            BinaryOp::BitOr => int32(|a, b| a | b),
            BinaryOp::BitXor => int32(|a, b| a ^ b),
            BinaryOp::Shl => int32(|a, b| a.wrapping_shl(b as u32 & 31)),
            BinaryOp::Shr => int32(|a, b| a.wrapping_shr(b as u32 & 31)),
            BinaryOp::UShr => {
                let shift = to_int32(right.to_number()) as u32 & 31;
                let value = to_int32(left.to_number()) as u32;
                Some(Value::Number((value >> shift) as f64))
            }

            BinaryOp::In | BinaryOp::Instanceof => None,
        }
    }

    /// Applies a unary operator with JavaScript semantics.
    pub fn unary(op: UnaryOp, argument: &Value) -> Option<Value> {
        match op {
            UnaryOp::Not => Some(Value::Bool(!argument.truthy())),
            UnaryOp::Minus => Some(Value::Number(-argument.to_number())),
            UnaryOp::Plus => Some(Value::Number(argument.to_number())),
            UnaryOp::BitNot => Some(Value::Number(!to_int32(argument.to_number()) as f64)),
            UnaryOp::Typeof => Some(Value::String(argument.type_name().to_string())),
            UnaryOp::Void => Some(Value::Undefined),
            UnaryOp::Delete => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(string) => write!(f, "'{}'", string),
            Value::Array(elements) => {
                if elements.is_empty() {
                    return write!(f, "[]");
                }
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[ {} ]", items.join(", "))
            }
            Value::Object(properties) => {
                if properties.is_empty() {
                    return write!(f, "{{}}");
                }
                let items: Vec<String> = properties
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{ {} }}", items.join(", "))
            }
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}

/// Formats a number the way JavaScript's `String(n)` does for common values.
pub fn number_to_string(number: f64) -> String {
    if number.is_nan() {
        return String::from("NaN");
    }
    if number.is_infinite() {
        return String::from(if number > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if number == 0.0 {
        return String::from("0");
    }

    let magnitude = number.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", number);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    format!("{}", number)
}

/// Index named by a property key, only for canonical spellings like `"1"`.
fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == key)
}

fn string_to_number(string: &str) -> f64 {
    let trimmed = string.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |value| value as f64);
    }

    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like "inf" and "nan" that JavaScript does not
        _ if trimmed.chars().any(|ch| ch.is_ascii_alphabetic() && ch != 'e' && ch != 'E') => f64::NAN,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// ECMAScript ToInt32.
pub fn to_int32(number: f64) -> i32 {
    if !number.is_finite() {
        return 0;
    }

    let modulo = number.trunc() % 4294967296.0;
    let unsigned = if modulo < 0.0 {
        modulo + 4294967296.0
    } else {
        modulo
    };

    unsigned as u32 as i32
}
