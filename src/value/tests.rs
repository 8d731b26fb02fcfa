//! Unit tests for JavaScript value semantics.

use std::{collections::BTreeMap, rc::Rc};

use super::value::{number_to_string, to_int32, Value};
use crate::ast::expressions::{BinaryOp, UnaryOp};

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

#[test]
fn test_number_formatting() {
    assert_eq!(number_to_string(5.0), "5");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(0.5), "0.5");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(number_to_string(1e21), "1e+21");
    assert_eq!(number_to_string(1.5e-7), "1.5e-7");
}

#[test]
fn test_addition_concatenates_strings() {
    assert_eq!(Value::binary(BinaryOp::Add, &num(2.0), &num(3.0)), Some(num(5.0)));
    assert_eq!(Value::binary(BinaryOp::Add, &string("a"), &num(1.0)), Some(string("a1")));
    assert_eq!(
        Value::binary(BinaryOp::Add, &Value::Bool(true), &num(1.0)),
        Some(num(2.0))
    );
}

#[test]
fn test_arithmetic_and_bitwise() {
    assert_eq!(Value::binary(BinaryOp::Mul, &num(5.0), &num(2.0)), Some(num(10.0)));
    assert_eq!(Value::binary(BinaryOp::Rem, &num(7.0), &num(4.0)), Some(num(3.0)));
    assert_eq!(Value::binary(BinaryOp::Pow, &num(2.0), &num(10.0)), Some(num(1024.0)));
    assert_eq!(Value::binary(BinaryOp::BitOr, &num(5.0), &num(2.0)), Some(num(7.0)));
    assert_eq!(Value::binary(BinaryOp::Shl, &num(1.0), &num(33.0)), Some(num(2.0)));
    assert_eq!(Value::binary(BinaryOp::UShr, &num(-1.0), &num(28.0)), Some(num(15.0)));
    assert_eq!(Value::unary(UnaryOp::BitNot, &num(5.0)), Some(num(-6.0)));
    assert_eq!(to_int32(4294967297.0), 1);
}

#[test]
fn test_equality() {
    assert!(Value::Null.loose_equals(&Value::Undefined));
    assert!(!Value::Null.strict_equals(&Value::Undefined));
    assert!(num(1.0).loose_equals(&string("1")));
    assert!(Value::Bool(true).loose_equals(&num(1.0)));
    assert!(!num(f64::NAN).strict_equals(&num(f64::NAN)));

    let array = Value::Array(Rc::new(vec![num(1.0)]));
    assert!(array.strict_equals(&array.clone()));
    assert!(!array.strict_equals(&Value::Array(Rc::new(vec![num(1.0)]))));
    assert!(array.loose_equals(&string("1")));
}

#[test]
fn test_comparison() {
    assert_eq!(Value::binary(BinaryOp::Less, &string("a"), &string("b")), Some(Value::Bool(true)));
    assert_eq!(Value::binary(BinaryOp::Less, &string("10"), &num(9.0)), Some(Value::Bool(false)));
    assert_eq!(
        Value::binary(BinaryOp::GreaterEq, &num(f64::NAN), &num(0.0)),
        Some(Value::Bool(false))
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(Value::unary(UnaryOp::Not, &string("")), Some(Value::Bool(true)));
    assert_eq!(Value::unary(UnaryOp::Minus, &string("3")), Some(num(-3.0)));
    assert_eq!(Value::unary(UnaryOp::Typeof, &Value::Null), Some(string("object")));
    assert_eq!(Value::unary(UnaryOp::Void, &num(1.0)), Some(Value::Undefined));
    assert_eq!(Value::unary(UnaryOp::Delete, &num(1.0)), None);
}

#[test]
fn test_conversions() {
    assert!(string(" 12 ").to_number() == 12.0);
    assert!(string("0x10").to_number() == 16.0);
    assert!(string("nan").to_number().is_nan());
    assert_eq!(Value::Undefined.to_js_string(), "undefined");
    assert_eq!(
        Value::Array(Rc::new(vec![num(1.0), Value::Null, string("x")])).to_js_string(),
        "1,,x"
    );
    assert!(!num(0.0).truthy());
    assert!(Value::Object(Rc::new(BTreeMap::new())).truthy());
}

#[test]
fn test_property_reads() {
    let mut properties = BTreeMap::new();
    properties.insert("x".to_string(), num(1.0));
    let object = Value::Object(Rc::new(properties));

    assert_eq!(object.get("x"), Some(num(1.0)));
    assert_eq!(object.get("y"), None);
    assert_eq!(string("abc").get("length"), Some(num(3.0)));
    assert_eq!(string("abc").get("1"), Some(string("b")));
    assert_eq!(Value::Array(Rc::new(vec![num(4.0)])).get("length"), Some(num(1.0)));
}

#[test]
fn test_non_canonical_index_keys() {
    let array = Value::Array(Rc::new(vec![num(4.0), num(5.0)]));

    assert_eq!(array.get("01"), None);
    assert_eq!(array.get("+1"), None);
    assert_eq!(string("abc").get("+1"), None);
    assert_eq!(string("abc").get("0"), Some(string("a")));
}

#[test]
fn test_display_like_inspect() {
    let array = Value::Array(Rc::new(vec![num(1.0), string("a")]));
    assert_eq!(array.to_string(), "[ 1, 'a' ]");
    assert_eq!(Value::Null.to_string(), "null");
}
