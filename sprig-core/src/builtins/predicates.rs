// sprig-core - Type predicate built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type predicates: nil?, some?, boolean?, number?, etc.

use sprig_parser::Value;

use crate::error::{Error, Result};

fn unary<'a>(op: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [x] => Ok(x),
        _ => Err(Error::arity_named(op, 1, args.len())),
    }
}

// ============================================================================
// Type Predicates
// ============================================================================

pub(crate) fn builtin_nil_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("nil?", args)?.is_nil()))
}

pub(crate) fn builtin_some_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(!unary("some?", args)?.is_nil()))
}

pub(crate) fn builtin_boolean_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("boolean?", args)?, Value::Boolean(_))))
}

pub(crate) fn builtin_true_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("true?", args)?, Value::Boolean(true))))
}

pub(crate) fn builtin_false_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("false?", args)?, Value::Boolean(false))))
}

pub(crate) fn builtin_number_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("number?", args)?.is_number()))
}

pub(crate) fn builtin_integer_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("integer?", args)?, Value::Long(_))))
}

pub(crate) fn builtin_double_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("double?", args)?, Value::Double(_))))
}

pub(crate) fn builtin_decimal_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("decimal?", args)?, Value::Decimal(_))))
}

pub(crate) fn builtin_string_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("string?", args)?, Value::String(_))))
}

pub(crate) fn builtin_char_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("char?", args)?, Value::Char(_))))
}

pub(crate) fn builtin_symbol_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("symbol?", args)?, Value::Symbol(..))))
}

pub(crate) fn builtin_keyword_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("keyword?", args)?, Value::Keyword(_))))
}

pub(crate) fn builtin_bytes_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("bytes?", args)?, Value::ByteBuffer(_))))
}

// ============================================================================
// Collection Predicates
// ============================================================================

pub(crate) fn builtin_list_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("list?", args)?, Value::List(..))))
}

pub(crate) fn builtin_vector_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("vector?", args)?, Value::Vector(..))))
}

pub(crate) fn builtin_map_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("map?", args)?, Value::Map(..))))
}

pub(crate) fn builtin_set_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("set?", args)?, Value::Set(..))))
}

pub(crate) fn builtin_coll_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("coll?", args)?.is_collection()))
}

pub(crate) fn builtin_sequential_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("sequential?", args)?.is_sequential()))
}

pub(crate) fn builtin_seqable_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("seqable?", args)?.seq_items().is_some()))
}

pub(crate) fn builtin_sorted_p(args: &[Value]) -> Result<Value> {
    use sprig_parser::{MapKind, SetKind};
    let sorted = match unary("sorted?", args)? {
        Value::Map(map, _) => map.kind() == MapKind::Sorted,
        Value::Set(set, _) => set.kind() == SetKind::Sorted,
        _ => false,
    };
    Ok(Value::Boolean(sorted))
}

// ============================================================================
// Reference and Function Predicates
// ============================================================================

pub(crate) fn builtin_fn_p(args: &[Value]) -> Result<Value> {
    let value = unary("fn?", args)?;
    Ok(Value::Boolean(
        value.as_function().is_some_and(|f| !f.is_macro()),
    ))
}

pub(crate) fn builtin_macro_p(args: &[Value]) -> Result<Value> {
    let value = unary("macro?", args)?;
    Ok(Value::Boolean(value.as_function().is_some_and(|f| f.is_macro())))
}

pub(crate) fn builtin_atom_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("atom?", args)?, Value::Atom(_))))
}

pub(crate) fn builtin_volatile_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("volatile?", args)?, Value::Volatile(_))))
}

pub(crate) fn builtin_host_p(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(matches!(unary("host?", args)?, Value::Host(_))))
}

// ============================================================================
// Logic
// ============================================================================

/// (not x)
pub(crate) fn builtin_not(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(!unary("not", args)?.is_truthy()))
}

/// (boolean x) - truthiness as a boolean
pub(crate) fn builtin_boolean(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(unary("boolean", args)?.is_truthy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_nil_and_false_are_falsey() {
        assert_eq!(builtin_not(&[Value::Nil]).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_not(&[Value::Boolean(false)]).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_not(&[Value::Long(0)]).unwrap(), Value::Boolean(false));
        assert_eq!(builtin_boolean(&[Value::string("")]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_collection_predicates() {
        let v = Value::vector(vec![]);
        assert_eq!(builtin_vector_p(&[v.clone()]).unwrap(), Value::Boolean(true));
        assert_eq!(builtin_list_p(&[v.clone()]).unwrap(), Value::Boolean(false));
        assert_eq!(builtin_sequential_p(&[v]).unwrap(), Value::Boolean(true));
        assert_eq!(
            builtin_sorted_p(&[Value::sorted_set(vec![Value::Long(1)])]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_predicates_check_arity() {
        assert!(builtin_nil_p(&[]).is_err());
        assert!(builtin_string_p(&[Value::Nil, Value::Nil]).is_err());
    }
}
