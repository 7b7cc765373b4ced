#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]
#![allow(clippy::float_cmp, reason = "conversions are exact for these inputs")]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{heap, int, name, native, put};
use crate::ObjectErrorKind;

fn string(heap: &mut ObjectHeap, text: &str) -> ObjectId {
    heap.alloc(ObjectKind::Str(text.to_owned()))
}

/// An object whose public `valueOf` returns `value`.
fn valued(heap: &mut ObjectHeap, value: i32) -> ObjectId {
    let obj = heap.alloc(ObjectKind::Object);
    let value_of = name(heap, "valueOf");
    let function = heap.new_function(
        value_of,
        native(move |heap, _, _, _| Ok(Some(heap.alloc(ObjectKind::Integer(value))))),
    );
    put(heap, obj, "valueOf", function);
    obj
}

#[test]
fn test_int32_conversion() {
    assert_eq!(to_int32(3.9), 3);
    assert_eq!(to_int32(-3.9), -3);
    assert_eq!(to_int32(2_147_483_648.0), -2_147_483_648);
    assert_eq!(to_int32(4_294_967_297.0), 1);
    assert_eq!(to_int32(f64::NAN), 0);
    assert_eq!(to_int32(f64::INFINITY), 0);
}

#[test]
fn test_number_parsing() {
    assert_eq!(parse_number("  12.5 "), 12.5);
    assert_eq!(parse_number(""), 0.0);
    assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
    assert!(parse_number("twelve").is_nan());
}

#[test]
fn test_number_literal_grammar() {
    assert_eq!(parse_number("0x10"), 16.0);
    assert_eq!(parse_number("0XfF"), 255.0);
    assert_eq!(parse_number("1e3"), 1000.0);
    assert_eq!(parse_number("-2.5E-1"), -0.25);
    assert_eq!(parse_number(".5"), 0.5);
    assert_eq!(parse_number("5."), 5.0);
    assert_eq!(parse_number("+Infinity"), f64::INFINITY);

    for rejected in ["inf", "infinity", "NaN", "+-1", ".", "1e", "0x", "-0x10", "0xg", "1_000"] {
        assert!(parse_number(rejected).is_nan(), "{rejected:?} should be NaN");
    }
}

#[test]
fn test_plain_strings() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let number = heap.alloc(ObjectKind::Number(3.0));
    let fraction = heap.alloc(ObjectKind::Number(0.5));
    let flag = heap.alloc(ObjectKind::Boolean(true));
    let null = heap.alloc(ObjectKind::Null);
    let seven = int(&mut heap, 7);

    assert_eq!(heap.to_string(obj, false).unwrap(), "[object Object]");
    assert_eq!(heap.to_string(number, false).unwrap(), "3");
    assert_eq!(heap.to_string(fraction, false).unwrap(), "0.5");
    assert_eq!(heap.to_string(flag, false).unwrap(), "true");
    assert_eq!(heap.to_string(null, false).unwrap(), "null");
    assert_eq!(heap.to_string(seven, false).unwrap(), "7");
}

#[test]
fn test_script_to_string_overload() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let to_string = name(&heap, "toString");
    let function = heap.new_function(
        to_string,
        native(|heap, _, _, _| Ok(Some(heap.alloc(ObjectKind::Str("custom".to_owned()))))),
    );
    put(&mut heap, obj, "toString", function);

    assert_eq!(heap.to_string(obj, false).unwrap(), "custom");
    assert_eq!(heap.to_string(obj, true).unwrap(), "[object Object]");
}

#[test]
fn test_to_string_overload_must_return_string() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let to_string = name(&heap, "toString");
    let function = heap.new_function(
        to_string,
        native(|heap, _, _, _| Ok(Some(heap.alloc(ObjectKind::Integer(1))))),
    );
    put(&mut heap, obj, "toString", function);

    let err = heap.to_string(obj, false).unwrap_err();
    assert_eq!(
        err.kind,
        ObjectErrorKind::UnexpectedResult {
            expected: "String",
            got: "int"
        }
    );
}

#[test]
fn test_numeric_coercions() {
    let mut heap = heap();
    let negative = int(&mut heap, -1);
    let text = string(&mut heap, "42");
    let undefined = heap.alloc(ObjectKind::Undefined);
    let big = heap.alloc(ObjectKind::Number(3_000_000_000.0));

    assert_eq!(heap.to_int(text).unwrap(), 42);
    assert_eq!(heap.to_uint(negative).unwrap(), u32::MAX);
    assert_eq!(heap.to_int(big).unwrap(), -1_294_967_296);
    assert_eq!(heap.to_int(undefined).unwrap(), 0);
    assert!(heap.to_number(undefined).unwrap().is_nan());
    assert_eq!(heap.to_number(text).unwrap(), 42.0);
}

#[test]
fn test_objects_do_not_coerce_to_numbers() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let err = heap.to_int(obj).unwrap_err();
    assert_eq!(
        err.kind,
        ObjectErrorKind::ConversionFailed {
            type_name: "Object",
            target: "int"
        }
    );
    assert!(!err.is_fatal());
    assert!(heap.to_number(obj).is_err());
}

#[test]
fn test_identity_is_equal() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let value = int(&mut heap, 1);
    put(&mut heap, obj, "x", value);
    assert!(heap.is_equal(obj, obj).unwrap());
}

#[test]
fn test_distinct_plain_objects_differ() {
    let mut heap = heap();
    let a = heap.alloc(ObjectKind::Object);
    let b = heap.alloc(ObjectKind::Object);
    assert!(!heap.is_equal(a, b).unwrap());
}

#[test]
fn test_nullish_equality() {
    let mut heap = heap();
    let null = heap.alloc(ObjectKind::Null);
    let undefined = heap.alloc(ObjectKind::Undefined);
    let obj = heap.alloc(ObjectKind::Object);
    assert!(heap.is_equal(null, undefined).unwrap());
    assert!(!heap.is_equal(obj, null).unwrap());
    assert!(!heap.is_equal(undefined, obj).unwrap());
}

#[test]
fn test_primitive_equality() {
    let mut heap = heap();
    let one = int(&mut heap, 1);
    let one_float = heap.alloc(ObjectKind::Number(1.0));
    let text = string(&mut heap, "1");
    let other = string(&mut heap, "one");
    let flag = heap.alloc(ObjectKind::Boolean(true));

    assert!(heap.is_equal(one, one_float).unwrap());
    assert!(heap.is_equal(one, text).unwrap());
    assert!(heap.is_equal(flag, one).unwrap());
    assert!(!heap.is_equal(text, other).unwrap());
}

#[test]
fn test_equals_overload() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    let target = heap.alloc(ObjectKind::Object);
    let equals = name(&heap, "equals");
    let function = heap.new_function(
        equals,
        native(move |heap, _, args, _| Ok(Some(heap.alloc(ObjectKind::Boolean(args[0] == target))))),
    );
    put(&mut heap, obj, "equals", function);
    let stranger = heap.alloc(ObjectKind::Object);

    assert!(heap.is_equal(obj, target).unwrap());
    assert!(!heap.is_equal(obj, stranger).unwrap());
}

#[test]
fn test_value_of_equality() {
    let mut heap = heap();
    let a = valued(&mut heap, 5);
    let b = valued(&mut heap, 5);
    let c = valued(&mut heap, 6);
    assert!(heap.is_equal(a, b).unwrap());
    assert!(!heap.is_equal(a, c).unwrap());

    // Results of valueOf are released after the comparison
    let before = heap.stats().live_objects;
    heap.is_equal(a, b).unwrap();
    assert_eq!(heap.stats().live_objects, before);
}

#[test]
fn test_value_of_requires_both_operands() {
    let mut heap = heap();
    let a = valued(&mut heap, 5);
    let plain = heap.alloc(ObjectKind::Object);
    let err = heap.is_equal(a, plain).unwrap_err();
    assert_eq!(err.kind, ObjectErrorKind::MissingValueOf);
    assert!(!err.is_fatal());
}

#[test]
fn test_value_of_against_primitive() {
    let mut heap = heap();
    let three = valued(&mut heap, 3);
    let boxed = int(&mut heap, 3);
    let other = heap.alloc(ObjectKind::Number(4.0));
    let live = heap.stats().live_objects;

    assert!(heap.is_equal(three, boxed).unwrap());
    assert!(heap.is_equal(boxed, three).unwrap());
    assert!(!heap.is_equal(three, other).unwrap());
    assert!(!heap.is_equal(other, three).unwrap());
    assert_eq!(heap.stats().live_objects, live);
    assert_eq!(heap.ref_count(boxed).unwrap(), 1);
}

#[test]
fn test_plain_object_against_primitive() {
    let mut heap = heap();
    let plain = heap.alloc(ObjectKind::Object);
    let boxed = int(&mut heap, 3);
    assert!(!heap.is_equal(plain, boxed).unwrap());
    assert!(!heap.is_equal(boxed, plain).unwrap());
    assert!(heap.is_less(plain, boxed).is_err());
    assert!(heap.is_less(boxed, plain).is_err());
}

#[test]
fn test_primitive_ordering() {
    let mut heap = heap();
    let one = int(&mut heap, 1);
    let two = heap.alloc(ObjectKind::Number(2.5));
    let apple = string(&mut heap, "apple");
    let banana = string(&mut heap, "banana");
    let nan = heap.alloc(ObjectKind::Number(f64::NAN));

    assert!(heap.is_less(one, two).unwrap());
    assert!(!heap.is_less(two, one).unwrap());
    assert!(heap.is_less(apple, banana).unwrap());
    assert!(!heap.is_less(nan, one).unwrap());
    assert!(!heap.is_less(one, nan).unwrap());
}

#[test]
fn test_value_of_ordering() {
    let mut heap = heap();
    let small = valued(&mut heap, 1);
    let large = valued(&mut heap, 9);
    assert!(heap.is_less(small, large).unwrap());
    assert!(!heap.is_less(large, small).unwrap());
}

#[test]
fn test_value_of_ordering_against_primitive() {
    let mut heap = heap();
    let three = valued(&mut heap, 3);
    let four = int(&mut heap, 4);
    let two = string(&mut heap, "2");
    let live = heap.stats().live_objects;

    assert!(heap.is_less(three, four).unwrap());
    assert!(!heap.is_less(four, three).unwrap());
    assert!(heap.is_less(two, three).unwrap());
    assert!(!heap.is_less(three, two).unwrap());
    assert_eq!(heap.stats().live_objects, live);
}

#[test]
fn test_unordered_objects() {
    let mut heap = heap();
    let a = heap.alloc(ObjectKind::Object);
    let b = heap.alloc(ObjectKind::Object);
    let err = heap.is_less(a, b).unwrap_err();
    assert_eq!(
        err.kind,
        ObjectErrorKind::UnorderedComparison {
            left: "Object",
            right: "Object"
        }
    );
    assert!(!err.is_fatal());
}
