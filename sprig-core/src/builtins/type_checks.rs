// sprig-core - Type checking built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type operations: type, instance?, hash, plus evaluator introspection.

use std::hash::{DefaultHasher, Hash, Hasher};

use sprig_parser::{Keyword, Value};

use crate::context::Context;
use crate::error::{Error, Result};

/// The keyword naming a value's type. Custom values report their declared
/// type and host objects their host type name.
pub(crate) fn type_keyword(value: &Value) -> Keyword {
    match value {
        Value::Custom(c) => c.type_name.clone(),
        Value::Host(h) => Keyword::new(h.type_name()),
        other => Keyword::new(other.type_name()),
    }
}

/// (type x)
pub(crate) fn builtin_type(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("type", 1, args.len()));
    };
    Ok(Value::Keyword(type_keyword(value)))
}

/// (instance? :type x)
pub(crate) fn builtin_instance_p(args: &[Value]) -> Result<Value> {
    let [Value::Keyword(kw), value] = args else {
        return match args {
            [other, _] => Err(Error::type_mismatch_in("instance?", "keyword", other.type_name())),
            _ => Err(Error::arity_named("instance?", 2, args.len())),
        };
    };
    Ok(Value::Boolean(type_keyword(value) == *kw))
}

/// (hash x) - consistent with `=`
pub(crate) fn builtin_hash(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("hash", 1, args.len()));
    };
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    Ok(Value::Long(hasher.finish() as i64))
}

// ============================================================================
// Evaluator introspection
// ============================================================================

/// (eval-depth) - nested activations on this thread
pub(crate) fn builtin_eval_depth(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_named("eval-depth", 0, args.len()));
    }
    Ok(Value::Long(ctx.depth() as i64))
}

/// (call-stack) - frames innermost first, as strings
pub(crate) fn builtin_call_stack(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_named("call-stack", 0, args.len()));
    }
    Ok(Value::vector(
        ctx.call_stack()
            .iter()
            .rev()
            .map(|frame| Value::from(frame.to_string()))
            .collect(),
    ))
}

/// (bound? 'sym) - whether a global is defined
pub(crate) fn builtin_bound_p(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [Value::Symbol(sym, _)] = args else {
        return match args {
            [other] => Err(Error::type_mismatch_in("bound?", "symbol", other.type_name())),
            _ => Err(Error::arity_named("bound?", 1, args.len())),
        };
    };
    let found = ctx.globals().resolve(sym, ctx.namespace()).is_some();
    Ok(Value::Boolean(found))
}

/// (var-names) - sorted symbols of every defined global
pub(crate) fn builtin_var_names(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if !args.is_empty() {
        return Err(Error::arity_named("var-names", 0, args.len()));
    }
    let names = ctx.globals().var_names();
    Ok(Value::list(names.into_iter().map(Value::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_parser::CustomValue;

    #[test]
    fn test_type_of_custom_value() {
        let point = Value::custom(CustomValue::record(
            Keyword::new("point"),
            vec![(Keyword::new("x"), Value::Long(1))],
        ));
        assert_eq!(builtin_type(&[point.clone()]).unwrap(), Value::keyword("point"));
        assert_eq!(
            builtin_instance_p(&[Value::keyword("point"), point]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(builtin_type(&[Value::Long(1)]).unwrap(), Value::keyword("long"));
    }

    #[test]
    fn test_hash_agrees_with_equality() {
        let a = builtin_hash(&[Value::vector(vec![Value::Long(1)])]).unwrap();
        let b = builtin_hash(&[Value::vector(vec![Value::Long(1)])]).unwrap();
        assert_eq!(a, b);
    }
}
