// sprig-core - Comparison built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Comparison operations: =, not=, ==, <, >, <=, >=, compare, identical?
//!
//! `=` is structural and variant-strict, so `(= 1 1.0)` is false. `==` and
//! the ordering operators compare numbers by value across the tower.

use std::cmp::Ordering;

use sprig_parser::{Value, compare_numeric};

use crate::error::{Error, Result};

// ============================================================================
// Equality
// ============================================================================

/// (= x y & more)
pub(crate) fn builtin_eq(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(args.windows(2).all(|w| w[0] == w[1])))
}

/// (not= x y & more)
pub(crate) fn builtin_not_eq(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(!args.windows(2).all(|w| w[0] == w[1])))
}

/// (identical? x y) - same object for reference values, equal otherwise
pub(crate) fn builtin_identical_p(args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("identical?", 2, args.len()));
    }
    let same = match (&args[0], &args[1]) {
        (Value::List(a, _), Value::List(b, _)) => std::sync::Arc::ptr_eq(a, b),
        (Value::Map(a, _), Value::Map(b, _)) => std::sync::Arc::ptr_eq(a, b),
        (Value::Set(a, _), Value::Set(b, _)) => std::sync::Arc::ptr_eq(a, b),
        (a, b) => a == b,
    };
    Ok(Value::Boolean(same))
}

// ============================================================================
// Numeric ordering
// ============================================================================

fn numeric_chain(op: &str, args: &[Value], ok: fn(Ordering) -> bool) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::arity_at_least(op, 1, 0));
    }
    for arg in args {
        if !arg.is_number() {
            return Err(Error::type_mismatch_in(op, "number", arg.type_name()));
        }
    }
    let holds = args.windows(2).all(|w| {
        compare_numeric(&w[0], &w[1]).is_some_and(ok) && !is_nan(&w[0]) && !is_nan(&w[1])
    });
    Ok(Value::Boolean(holds))
}

fn is_nan(value: &Value) -> bool {
    matches!(value, Value::Double(d) if d.is_nan())
}

/// (== x y & more) - numeric equality across variants
pub(crate) fn builtin_num_eq(args: &[Value]) -> Result<Value> {
    numeric_chain("==", args, Ordering::is_eq)
}

/// (< x y & more)
pub(crate) fn builtin_lt(args: &[Value]) -> Result<Value> {
    numeric_chain("<", args, Ordering::is_lt)
}

/// (> x y & more)
pub(crate) fn builtin_gt(args: &[Value]) -> Result<Value> {
    numeric_chain(">", args, Ordering::is_gt)
}

/// (<= x y & more)
pub(crate) fn builtin_le(args: &[Value]) -> Result<Value> {
    numeric_chain("<=", args, Ordering::is_le)
}

/// (>= x y & more)
pub(crate) fn builtin_ge(args: &[Value]) -> Result<Value> {
    numeric_chain(">=", args, Ordering::is_ge)
}

/// (compare x y) - -1, 0 or 1 under the total value order
pub(crate) fn builtin_compare(args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("compare", 2, args.len()));
    }
    Ok(Value::Long(match args[0].cmp(&args[1]) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_variant_strict() {
        assert_eq!(
            builtin_eq(&[Value::Long(1), Value::Double(1.0)]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            builtin_num_eq(&[Value::Long(1), Value::Double(1.0)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(builtin_eq(&[Value::Nil]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_chains() {
        let nums = [Value::Long(1), Value::Double(2.5), Value::Long(3)];
        assert_eq!(builtin_lt(&nums).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_gt(&nums).unwrap(), Value::Boolean(false));
        assert_eq!(
            builtin_le(&[Value::Long(2), Value::Long(2)]).unwrap(),
            Value::Boolean(true)
        );
        assert!(builtin_lt(&[Value::Long(1), Value::Nil]).is_err());
        assert_eq!(
            builtin_lt(&[Value::Double(f64::NAN), Value::Long(1)]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_compare_is_total() {
        assert_eq!(
            builtin_compare(&[Value::Long(1), Value::Long(2)]).unwrap(),
            Value::Long(-1)
        );
        assert_eq!(
            builtin_compare(&[Value::string("b"), Value::string("a")]).unwrap(),
            Value::Long(1)
        );
    }
}
