// sprig-core - Arithmetic built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic over the numeric tower: +, -, *, /, quot, rem, mod, inc,
//! dec, max, min, abs and the numeric predicates.
//!
//! ## Promotion
//!
//! Long op Long stays Long and fails on overflow rather than wrapping.
//! A Double operand makes the result a Double; a Decimal operand makes it
//! a Decimal. `/` on two longs truncates toward zero.

use std::cmp::Ordering;

use num_traits::{FromPrimitive, ToPrimitive, Zero};
use sprig_parser::{BigDecimal, Value, compare_numeric};

use crate::error::{Error, Result};

// ============================================================================
// Helpers
// ============================================================================

fn require_number(op: &str, val: &Value) -> Result<()> {
    if val.is_number() {
        Ok(())
    } else {
        Err(Error::type_mismatch_in(op, "number", val.type_name()))
    }
}

pub(crate) fn to_f64(val: &Value) -> Option<f64> {
    match val {
        Value::Long(n) => Some(*n as f64),
        Value::Double(d) => Some(*d),
        Value::Decimal(d) => d.to_f64(),
        _ => None,
    }
}

pub(crate) fn to_decimal(op: &str, val: &Value) -> Result<BigDecimal> {
    match val {
        Value::Long(n) => Ok(BigDecimal::from(*n)),
        Value::Double(d) => BigDecimal::from_f64(*d)
            .ok_or_else(|| Error::eval(format!("{op}: {d} has no decimal value"))),
        Value::Decimal(d) => Ok((**d).clone()),
        other => Err(Error::type_mismatch_in(op, "number", other.type_name())),
    }
}

fn overflow(op: &str) -> Error {
    Error::eval(format!("Long overflow in {op}"))
}

struct BinaryOp {
    name: &'static str,
    long: fn(i64, i64) -> Option<i64>,
    double: fn(f64, f64) -> f64,
    decimal: fn(&BigDecimal, &BigDecimal) -> BigDecimal,
}

fn apply_op(op: &BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    require_number(op.name, a)?;
    require_number(op.name, b)?;
    match (a, b) {
        (Value::Long(x), Value::Long(y)) => (op.long)(*x, *y)
            .map(Value::Long)
            .ok_or_else(|| overflow(op.name)),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            let x = to_decimal(op.name, a)?;
            let y = to_decimal(op.name, b)?;
            Ok(Value::decimal((op.decimal)(&x, &y)))
        }
        _ => {
            let x = to_f64(a).unwrap_or(f64::NAN);
            let y = to_f64(b).unwrap_or(f64::NAN);
            Ok(Value::Double((op.double)(x, y)))
        }
    }
}

const ADD: BinaryOp = BinaryOp {
    name: "+",
    long: i64::checked_add,
    double: |x, y| x + y,
    decimal: |x, y| x + y,
};

const SUB: BinaryOp = BinaryOp {
    name: "-",
    long: i64::checked_sub,
    double: |x, y| x - y,
    decimal: |x, y| x - y,
};

const MUL: BinaryOp = BinaryOp {
    name: "*",
    long: i64::checked_mul,
    double: |x, y| x * y,
    decimal: |x, y| x * y,
};

fn is_zero(val: &Value) -> bool {
    match val {
        Value::Long(n) => *n == 0,
        Value::Decimal(d) => d.is_zero(),
        _ => false,
    }
}

fn fold(op: &BinaryOp, identity: Value, args: &[Value]) -> Result<Value> {
    let mut acc = identity;
    for arg in args {
        acc = apply_op(op, &acc, arg)?;
    }
    Ok(acc)
}

// ============================================================================
// Operators
// ============================================================================

/// (+ nums*) - sum, 0 when empty
pub(crate) fn builtin_add(args: &[Value]) -> Result<Value> {
    fold(&ADD, Value::Long(0), args)
}

/// (* nums*) - product, 1 when empty
pub(crate) fn builtin_mul(args: &[Value]) -> Result<Value> {
    fold(&MUL, Value::Long(1), args)
}

/// (- x) negates; (- x y ...) subtracts left to right
pub(crate) fn builtin_sub(args: &[Value]) -> Result<Value> {
    match args {
        [] => Err(Error::arity_at_least("-", 1, 0)),
        [x] => apply_op(&SUB, &Value::Long(0), x),
        [first, rest @ ..] => {
            require_number("-", first)?;
            fold(&SUB, first.clone(), rest)
        }
    }
}

fn divide(a: &Value, b: &Value) -> Result<Value> {
    require_number("/", a)?;
    require_number("/", b)?;
    if is_zero(b) {
        return Err(Error::eval("Divide by zero"));
    }
    match (a, b) {
        (Value::Long(x), Value::Long(y)) => x
            .checked_div(*y)
            .map(Value::Long)
            .ok_or_else(|| overflow("/")),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            let x = to_decimal("/", a)?;
            let y = to_decimal("/", b)?;
            Ok(Value::decimal(x / y))
        }
        _ => Ok(Value::Double(
            to_f64(a).unwrap_or(f64::NAN) / to_f64(b).unwrap_or(f64::NAN),
        )),
    }
}

/// (/ x) is 1/x; (/ x y ...) divides left to right
pub(crate) fn builtin_div(args: &[Value]) -> Result<Value> {
    match args {
        [] => Err(Error::arity_at_least("/", 1, 0)),
        [x] => divide(&Value::Long(1), x),
        [first, rest @ ..] => {
            let mut acc = first.clone();
            for arg in rest {
                acc = divide(&acc, arg)?;
            }
            Ok(acc)
        }
    }
}

fn long_pair(op: &str, args: &[Value]) -> Result<(i64, i64)> {
    if args.len() != 2 {
        return Err(Error::arity_named(op, 2, args.len()));
    }
    match (&args[0], &args[1]) {
        (Value::Long(_), Value::Long(0)) => Err(Error::eval("Divide by zero")),
        (Value::Long(x), Value::Long(y)) => Ok((*x, *y)),
        (Value::Long(_), other) | (other, _) => {
            Err(Error::type_mismatch_in(op, "long", other.type_name()))
        }
    }
}

/// (quot n d) - truncating integer division
pub(crate) fn builtin_quot(args: &[Value]) -> Result<Value> {
    let (n, d) = long_pair("quot", args)?;
    n.checked_div(d).map(Value::Long).ok_or_else(|| overflow("quot"))
}

/// (rem n d) - remainder with the sign of n
pub(crate) fn builtin_rem(args: &[Value]) -> Result<Value> {
    let (n, d) = long_pair("rem", args)?;
    n.checked_rem(d).map(Value::Long).ok_or_else(|| overflow("rem"))
}

/// (mod n d) - modulus with the sign of d
pub(crate) fn builtin_mod(args: &[Value]) -> Result<Value> {
    let (n, d) = long_pair("mod", args)?;
    let r = n.checked_rem(d).ok_or_else(|| overflow("mod"))?;
    Ok(Value::Long(if r != 0 && (r < 0) != (d < 0) { r + d } else { r }))
}

fn single<'a>(op: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [x] => {
            require_number(op, x)?;
            Ok(x)
        }
        _ => Err(Error::arity_named(op, 1, args.len())),
    }
}

/// (inc x)
pub(crate) fn builtin_inc(args: &[Value]) -> Result<Value> {
    apply_op(&ADD, single("inc", args)?, &Value::Long(1))
}

/// (dec x)
pub(crate) fn builtin_dec(args: &[Value]) -> Result<Value> {
    apply_op(&SUB, single("dec", args)?, &Value::Long(1))
}

/// (abs x)
pub(crate) fn builtin_abs(args: &[Value]) -> Result<Value> {
    match single("abs", args)? {
        Value::Long(n) => n.checked_abs().map(Value::Long).ok_or_else(|| overflow("abs")),
        Value::Double(d) => Ok(Value::Double(d.abs())),
        Value::Decimal(d) => Ok(Value::decimal(d.abs())),
        other => Err(Error::type_mismatch_in("abs", "number", other.type_name())),
    }
}

fn extreme(op: &str, args: &[Value], keep: Ordering) -> Result<Value> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Error::arity_at_least(op, 1, 0));
    };
    require_number(op, first)?;
    let mut best = first;
    for arg in rest {
        require_number(op, arg)?;
        if compare_numeric(arg, best) == Some(keep) {
            best = arg;
        }
    }
    Ok(best.clone())
}

/// (max x & more)
pub(crate) fn builtin_max(args: &[Value]) -> Result<Value> {
    extreme("max", args, Ordering::Greater)
}

/// (min x & more)
pub(crate) fn builtin_min(args: &[Value]) -> Result<Value> {
    extreme("min", args, Ordering::Less)
}

// ============================================================================
// Predicates and coercions
// ============================================================================

fn sign_is(op: &str, args: &[Value], wanted: Ordering) -> Result<Value> {
    let x = single(op, args)?;
    Ok(Value::Boolean(compare_numeric(x, &Value::Long(0)) == Some(wanted)))
}

/// (zero? x)
pub(crate) fn builtin_zero_p(args: &[Value]) -> Result<Value> {
    sign_is("zero?", args, Ordering::Equal)
}

/// (pos? x)
pub(crate) fn builtin_pos_p(args: &[Value]) -> Result<Value> {
    sign_is("pos?", args, Ordering::Greater)
}

/// (neg? x)
pub(crate) fn builtin_neg_p(args: &[Value]) -> Result<Value> {
    sign_is("neg?", args, Ordering::Less)
}

fn single_long(op: &str, args: &[Value]) -> Result<i64> {
    match args {
        [Value::Long(n)] => Ok(*n),
        [other] => Err(Error::type_mismatch_in(op, "long", other.type_name())),
        _ => Err(Error::arity_named(op, 1, args.len())),
    }
}

/// (even? n)
pub(crate) fn builtin_even_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(single_long("even?", args)? % 2 == 0))
}

/// (odd? n)
pub(crate) fn builtin_odd_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(single_long("odd?", args)? % 2 != 0))
}

/// (long x) - truncate a number, or parse a string
pub(crate) fn builtin_long(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Long(n)] => Ok(Value::Long(*n)),
        [Value::Double(d)] if d.is_finite() => Ok(Value::Long(d.trunc() as i64)),
        [Value::Decimal(d)] => d
            .to_i64()
            .map(Value::Long)
            .ok_or_else(|| Error::eval(format!("{d} does not fit in a long"))),
        [Value::Char(c)] => Ok(Value::Long(i64::from(u32::from(*c)))),
        [Value::String(s)] => s
            .trim()
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|_| Error::eval(format!("Cannot parse \"{s}\" as a long"))),
        [other] => Err(Error::type_mismatch_in("long", "number", other.type_name())),
        _ => Err(Error::arity_named("long", 1, args.len())),
    }
}

/// (double x)
pub(crate) fn builtin_double(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(s)] => s
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| Error::eval(format!("Cannot parse \"{s}\" as a double"))),
        [x] => to_f64(x)
            .map(Value::Double)
            .ok_or_else(|| Error::type_mismatch_in("double", "number", x.type_name())),
        _ => Err(Error::arity_named("double", 1, args.len())),
    }
}

/// (decimal x)
pub(crate) fn builtin_decimal(args: &[Value]) -> Result<Value> {
    match args {
        [Value::String(s)] => s
            .trim()
            .parse::<BigDecimal>()
            .map(Value::decimal)
            .map_err(|_| Error::eval(format!("Cannot parse \"{s}\" as a decimal"))),
        [x] => to_decimal("decimal", x).map(Value::decimal),
        _ => Err(Error::arity_named("decimal", 1, args.len())),
    }
}
